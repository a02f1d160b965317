use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use kiln_save::SavedData;
use kiln_validate::FormValidation;

pub fn print_validation(result: &FormValidation) {
    if result.is_valid {
        println!("{}", result.consolidated_message);
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Field"),
        header_cell("Error"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for (index, entry) in result.error_list.iter().enumerate() {
        table.add_row(vec![
            dim_cell(index + 1),
            Cell::new(field_of(entry)),
            Cell::new(message_of(entry)).fg(Color::Red),
        ]);
    }
    println!("{table}");
    println!("{} field(s) need attention", result.error_count());
}

pub fn print_save_summary(payload: &SavedData) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Key"), header_cell("Saved")]);
    apply_table_style(&mut table);
    for (key, value) in &payload.data {
        let saved = match value.as_array() {
            Some(rows) => Cell::new(format!("{} row(s)", rows.len())).fg(Color::Cyan),
            None => Cell::new("value"),
        };
        table.add_row(vec![Cell::new(key), saved]);
    }
    eprintln!("{table}");
}

/// Left side of an error list entry: path and label.
fn field_of(entry: &str) -> &str {
    entry.split_once(" - ").map_or(entry, |(field, _)| field)
}

fn message_of(entry: &str) -> &str {
    entry.split_once(" - ").map_or("", |(_, message)| message)
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
