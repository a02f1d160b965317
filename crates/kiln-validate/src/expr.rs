//! Restricted visibility expressions.
//!
//! `custom_visibility` strings are parsed into a small AST of comparisons
//! and boolean combinators over state lookups and literals. Nothing else is
//! accepted; there is no function call, assignment or member access beyond
//! `formState.key` / `formState["key"]`.
//!
//! ```text
//! program    := ["{"] ["return"] expr [";"] ["}"]
//! expr       := and ("||" and)*
//! and        := unary ("&&" unary)*
//! unary      := "!" unary | comparison
//! comparison := primary [op primary]
//! primary    := string | number | true | false | null | undefined
//!             | "formState" ("." ident | "[" string "]") | ident | "(" expr ")"
//! ```
//!
//! `!` and parentheses nest at most [`MAX_DEPTH`] levels.

use std::cmp::Ordering;
use std::fmt;

use kiln_model::StateMap;
use kiln_model::value::{is_truthy, js_string, number_value};
use serde_json::Value;

/// Deepest `!` / parenthesis nesting the parser accepts.
pub const MAX_DEPTH: usize = 64;

/// Errors that can occur while parsing a visibility expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("invalid number literal {literal:?}")]
    InvalidNumber { literal: String },
    #[error("expected {expected}, found {found}")]
    Unexpected { expected: String, found: String },
    #[error("expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl ComparisonOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOp::StrictEq => "===",
            ComparisonOp::StrictNe => "!==",
            ComparisonOp::LooseEq => "==",
            ComparisonOp::LooseNe => "!=",
            ComparisonOp::Less => "<",
            ComparisonOp::LessEq => "<=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterEq => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Undefined,
    /// Lookup of a key in the state the expression is evaluated against.
    State(String),
    Not(Box<Expr>),
    Comparison {
        left: Box<Expr>,
        op: ComparisonOp,
        right: Box<Expr>,
    },
    /// Chain of two or more operands joined by the same operator.
    Logical { op: LogicalOp, operands: Vec<Expr> },
}

impl Expr {
    /// Parse a visibility expression.
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        parser.program()
    }

    /// Evaluate against a state map and coerce the result to a boolean.
    pub fn evaluate(&self, state: &StateMap) -> bool {
        self.operand(state).is_truthy()
    }

    fn operand(&self, state: &StateMap) -> Operand {
        match self {
            Expr::Literal(value) => Operand::Value(value.clone()),
            Expr::Undefined => Operand::Undefined,
            Expr::State(key) => state
                .get(key)
                .cloned()
                .map_or(Operand::Undefined, Operand::Value),
            Expr::Not(inner) => Operand::Value(Value::Bool(!inner.operand(state).is_truthy())),
            Expr::Logical { op, operands } => {
                // JavaScript semantics: the deciding operand is the result.
                let mut last = Operand::Undefined;
                for operand in operands {
                    last = operand.operand(state);
                    match (op, last.is_truthy()) {
                        (LogicalOp::And, false) | (LogicalOp::Or, true) => return last,
                        _ => {}
                    }
                }
                last
            }
            Expr::Comparison { left, op, right } => {
                let left = left.operand(state);
                let right = right.operand(state);
                Operand::Value(Value::Bool(compare(&left, *op, &right)))
            }
        }
    }
}

/// Parse and evaluate in one step.
pub fn evaluate_expression(source: &str, state: &StateMap) -> Result<bool, ExprError> {
    Ok(Expr::parse(source)?.evaluate(state))
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Undefined,
    Value(Value),
}

impl Operand {
    fn is_truthy(&self) -> bool {
        match self {
            Operand::Undefined => false,
            Operand::Value(value) => is_truthy(value),
        }
    }

    fn is_nullish(&self) -> bool {
        matches!(self, Operand::Undefined | Operand::Value(Value::Null))
    }

    /// `Number(x)`; `None` stands for `NaN`.
    fn to_number(&self) -> Option<f64> {
        match self {
            Operand::Undefined => None,
            Operand::Value(Value::Null) => Some(0.0),
            Operand::Value(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            Operand::Value(Value::Number(n)) => n.as_f64(),
            Operand::Value(Value::String(s)) => string_to_number(s),
            Operand::Value(_) => None,
        }
    }

    /// Numeric reading used by relational operators: numbers and numeric
    /// strings only.
    fn numeric(&self) -> Option<f64> {
        match self {
            Operand::Value(Value::Number(n)) => n.as_f64(),
            Operand::Value(Value::String(s)) if !s.trim().is_empty() => string_to_number(s),
            _ => None,
        }
    }

    fn text(&self) -> Option<String> {
        match self {
            Operand::Undefined | Operand::Value(Value::Null) => None,
            Operand::Value(value) => Some(js_string(value)),
        }
    }
}

fn string_to_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    let looks_numeric = trimmed
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E'));
    if !looks_numeric {
        return match trimmed {
            "Infinity" | "+Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        };
    }
    trimmed.parse::<f64>().ok()
}

fn strict_equals(left: &Operand, right: &Operand) -> bool {
    match (left, right) {
        (Operand::Undefined, Operand::Undefined) => true,
        (Operand::Value(Value::Number(a)), Operand::Value(Value::Number(b))) => a.as_f64() == b.as_f64(),
        (Operand::Value(Value::Array(_) | Value::Object(_)), _)
        | (_, Operand::Value(Value::Array(_) | Value::Object(_))) => false,
        (Operand::Value(a), Operand::Value(b)) => a == b,
        _ => false,
    }
}

fn loose_equals(left: &Operand, right: &Operand) -> bool {
    if left.is_nullish() || right.is_nullish() {
        return left.is_nullish() && right.is_nullish();
    }
    match (left, right) {
        (Operand::Value(Value::String(a)), Operand::Value(Value::String(b))) => a == b,
        (Operand::Value(Value::Number(_) | Value::String(_) | Value::Bool(_)), _)
            if matches!(
                right,
                Operand::Value(Value::Number(_) | Value::String(_) | Value::Bool(_))
            ) =>
        {
            match (left.to_number(), right.to_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        _ => strict_equals(left, right),
    }
}

fn relational(left: &Operand, right: &Operand) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (left.numeric(), right.numeric()) {
        return a.partial_cmp(&b);
    }
    match (left.text(), right.text()) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => None,
    }
}

fn compare(left: &Operand, op: ComparisonOp, right: &Operand) -> bool {
    match op {
        ComparisonOp::StrictEq => strict_equals(left, right),
        ComparisonOp::StrictNe => !strict_equals(left, right),
        ComparisonOp::LooseEq => loose_equals(left, right),
        ComparisonOp::LooseNe => !loose_equals(left, right),
        ComparisonOp::Less => relational(left, right) == Some(Ordering::Less),
        ComparisonOp::LessEq => matches!(
            relational(left, right),
            Some(Ordering::Less | Ordering::Equal)
        ),
        ComparisonOp::Greater => relational(left, right) == Some(Ordering::Greater),
        ComparisonOp::GreaterEq => matches!(
            relational(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Num(f64),
    Ident(String),
    Op(ComparisonOp),
    And,
    Or,
    Bang,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Dot,
    Semi,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Str(s) => write!(f, "string {s:?}"),
            Token::Num(n) => write!(f, "number {n}"),
            Token::Ident(name) => write!(f, "identifier `{name}`"),
            Token::Op(op) => write!(f, "`{}`", op.as_str()),
            Token::And => f.write_str("`&&`"),
            Token::Or => f.write_str("`||`"),
            Token::Bang => f.write_str("`!`"),
            Token::LParen => f.write_str("`(`"),
            Token::RParen => f.write_str("`)`"),
            Token::LBracket => f.write_str("`[`"),
            Token::RBracket => f.write_str("`]`"),
            Token::LBrace => f.write_str("`{`"),
            Token::RBrace => f.write_str("`}`"),
            Token::Dot => f.write_str("`.`"),
            Token::Semi => f.write_str("`;`"),
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '$' | '-')
}

fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let peek = |i: usize| chars.get(i).map(|(_, ch)| *ch);

    while let Some(&(offset, ch)) = chars.get(i) {
        if ch.is_whitespace() {
            i += 1;
            continue;
        }
        let two = (Some(ch), peek(i + 1));
        let three = peek(i + 2);
        let (token, width) = match two {
            (Some('='), Some('=')) if three == Some('=') => (Token::Op(ComparisonOp::StrictEq), 3),
            (Some('!'), Some('=')) if three == Some('=') => (Token::Op(ComparisonOp::StrictNe), 3),
            (Some('='), Some('=')) => (Token::Op(ComparisonOp::LooseEq), 2),
            (Some('!'), Some('=')) => (Token::Op(ComparisonOp::LooseNe), 2),
            (Some('<'), Some('=')) => (Token::Op(ComparisonOp::LessEq), 2),
            (Some('>'), Some('=')) => (Token::Op(ComparisonOp::GreaterEq), 2),
            (Some('&'), Some('&')) => (Token::And, 2),
            (Some('|'), Some('|')) => (Token::Or, 2),
            (Some('<'), _) => (Token::Op(ComparisonOp::Less), 1),
            (Some('>'), _) => (Token::Op(ComparisonOp::Greater), 1),
            (Some('!'), _) => (Token::Bang, 1),
            (Some('('), _) => (Token::LParen, 1),
            (Some(')'), _) => (Token::RParen, 1),
            (Some('['), _) => (Token::LBracket, 1),
            (Some(']'), _) => (Token::RBracket, 1),
            (Some('{'), _) => (Token::LBrace, 1),
            (Some('}'), _) => (Token::RBrace, 1),
            (Some('.'), next) if !next.is_some_and(|c| c.is_ascii_digit()) => (Token::Dot, 1),
            (Some(';'), _) => (Token::Semi, 1),
            (Some(quote @ ('"' | '\'')), _) => {
                let (literal, width) = read_string(&chars[i..], quote)
                    .ok_or(ExprError::UnterminatedString { offset })?;
                (Token::Str(literal), width)
            }
            (Some(c), _) if c.is_ascii_digit() || c == '.' || c == '-' => {
                let width = chars[i..]
                    .iter()
                    .enumerate()
                    .take_while(|(n, (_, c))| {
                        c.is_ascii_digit()
                            || *c == '.'
                            || (*n == 0 && *c == '-')
                            || matches!(*c, 'e' | 'E')
                    })
                    .count();
                let literal: String = chars[i..i + width].iter().map(|(_, c)| *c).collect();
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| ExprError::InvalidNumber {
                        literal: literal.clone(),
                    })?;
                (Token::Num(number), width)
            }
            (Some(c), _) if is_ident_start(c) => {
                let width = chars[i..]
                    .iter()
                    .take_while(|(_, c)| is_ident_continue(*c))
                    .count();
                let name: String = chars[i..i + width].iter().map(|(_, c)| *c).collect();
                (Token::Ident(name), width)
            }
            (Some(found), _) => return Err(ExprError::UnexpectedChar { found, offset }),
            (None, _) => break,
        };
        tokens.push(token);
        i += width;
    }

    Ok(tokens)
}

/// Read a quoted string starting at `chars[0]`. Returns the unescaped text
/// and the number of characters consumed including both quotes.
fn read_string(chars: &[(usize, char)], quote: char) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut i = 1;
    while let Some(&(_, ch)) = chars.get(i) {
        match ch {
            c if c == quote => return Some((out, i + 1)),
            '\\' => {
                let &(_, escaped) = chars.get(i + 1)?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
                i += 2;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    None
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), ExprError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(&token.to_string()))
        }
    }

    fn descend(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep { limit: MAX_DEPTH });
        }
        Ok(())
    }

    fn unexpected(&self, expected: &str) -> ExprError {
        ExprError::Unexpected {
            expected: expected.to_string(),
            found: self
                .peek()
                .map_or_else(|| "end of input".to_string(), ToString::to_string),
        }
    }

    fn program(&mut self) -> Result<Expr, ExprError> {
        if self.tokens.is_empty() {
            return Err(ExprError::Empty);
        }
        let braced = self.eat(&Token::LBrace);
        if self.peek() == Some(&Token::Ident("return".to_string())) {
            self.pos += 1;
        }
        let expr = self.or()?;
        self.eat(&Token::Semi);
        if braced {
            self.expect(&Token::RBrace)?;
        }
        self.eat(&Token::Semi);
        if self.peek().is_some() {
            return Err(self.unexpected("end of input"));
        }
        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, ExprError> {
        let mut operands = vec![self.and()?];
        while self.eat(&Token::Or) {
            operands.push(self.and()?);
        }
        Ok(chain(LogicalOp::Or, operands))
    }

    fn and(&mut self) -> Result<Expr, ExprError> {
        let mut operands = vec![self.unary()?];
        while self.eat(&Token::And) {
            operands.push(self.unary()?);
        }
        Ok(chain(LogicalOp::And, operands))
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::Bang) {
            self.descend()?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ExprError> {
        let left = self.primary()?;
        if let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            self.pos += 1;
            let right = self.primary()?;
            return Ok(Expr::Comparison {
                left: Box::new(left),
                op,
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.unexpected("a value"));
        };
        let expr = match token {
            Token::Str(s) => Expr::Literal(Value::String(s)),
            Token::Num(n) => Expr::Literal(number_value(n)),
            Token::LParen => {
                self.pos += 1;
                self.descend()?;
                let inner = self.or()?;
                self.depth -= 1;
                self.expect(&Token::RParen)?;
                return Ok(inner);
            }
            Token::Ident(name) => match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" => Expr::Literal(Value::Null),
                "undefined" => Expr::Undefined,
                "formState" => {
                    self.pos += 1;
                    return self.state_member();
                }
                _ => Expr::State(name),
            },
            _ => return Err(self.unexpected("a value")),
        };
        self.pos += 1;
        Ok(expr)
    }

    fn state_member(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::Dot) {
            let Some(Token::Ident(name)) = self.peek().cloned() else {
                return Err(self.unexpected("a field name"));
            };
            self.pos += 1;
            return Ok(Expr::State(name));
        }
        self.expect(&Token::LBracket)?;
        let Some(Token::Str(key)) = self.peek().cloned() else {
            return Err(self.unexpected("a quoted field key"));
        };
        self.pos += 1;
        self.expect(&Token::RBracket)?;
        Ok(Expr::State(key))
    }
}

fn chain(op: LogicalOp, mut operands: Vec<Expr>) -> Expr {
    if operands.len() == 1 {
        return operands.remove(0);
    }
    Expr::Logical { op, operands }
}
