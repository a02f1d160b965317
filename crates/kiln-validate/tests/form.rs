//! Whole-form validation over plain, repeated and nested fields.

use kiln_model::{EngineOptions, FieldNode, RuntimeState};
use kiln_validate::validate_all_fields;
use serde_json::json;

fn dependents_form() -> Vec<FieldNode> {
    vec![
        FieldNode::leaf("name", "text-input")
            .with_attribute("labelText", "Name")
            .required(),
        FieldNode::container(
            "deps",
            vec![
                FieldNode::leaf("email", "text-input")
                    .with_attribute("labelText", "Email")
                    .with_attribute("email", true),
                FieldNode::leaf("age", "number-input")
                    .with_attribute("labelText", "Age")
                    .with_attribute("min", 0)
                    .with_attribute("max", 120),
            ],
        )
        .repeatable()
        .with_attribute("legend", "Dependents"),
        {
            let mut notes = FieldNode::leaf("notes", "text-area").required();
            notes.visible_web = Some(false);
            notes
        },
    ]
}

fn dependents_state() -> RuntimeState {
    let mut state = RuntimeState::new();
    state.publish("name", json!(""));
    state.publish("deps-g1-email", json!("a@b.co"));
    state.publish("deps-g1-age", json!("200"));
    state.publish("deps-g2-email", json!("bad"));
    state.publish("deps-g2-age", json!(4));
    state.set_group_ids("deps", ["g1", "g2"]);
    state
}

#[test]
fn reports_first_error_per_field_and_row() {
    let result = validate_all_fields(
        &dependents_form(),
        &dependents_state(),
        &EngineOptions::new(),
    );

    assert!(!result.is_valid);
    insta::assert_json_snapshot!(result, @r#"
    {
      "isValid": false,
      "errors": {
        "age__row_0": "Age must be between 0 and 120.",
        "email__row_1": "Email must be a valid email address.",
        "name": "Name is required."
      },
      "errorList": [
        "Name - is required.",
        "Dependents #1: Age - must be between 0 and 120.",
        "Dependents #2: Email - must be a valid email address."
      ],
      "consolidatedMessage": "Please fix the following errors:\n• Name - is required.\n• Dependents #1: Age - must be between 0 and 120.\n• Dependents #2: Email - must be a valid email address."
    }
    "#);
}

#[test]
fn consolidated_message_lists_every_entry() {
    let result = validate_all_fields(
        &dependents_form(),
        &dependents_state(),
        &EngineOptions::new(),
    );
    insta::assert_snapshot!(result.consolidated_message, @r"
    Please fix the following errors:
    • Name - is required.
    • Dependents #1: Age - must be between 0 and 120.
    • Dependents #2: Email - must be a valid email address.
    ");
}

#[test]
fn valid_form_reports_all_clear() {
    let mut state = dependents_state();
    state.publish("name", json!("Pat"));
    state.publish("deps-g1-age", json!("7"));
    state.publish("deps-g2-email", json!("kid@example.org"));

    let result = validate_all_fields(&dependents_form(), &state, &EngineOptions::new());
    assert!(result.is_valid);
    assert!(result.errors.is_empty());
    assert_eq!(result.consolidated_message, "All fields are valid.");
}

#[test]
fn inactive_inferred_rows_are_not_validated() {
    let mut state = RuntimeState::new();
    state.publish("name", json!("Pat"));
    state.publish("deps-g1-email", json!("ok@example.org"));
    state.publish("deps-old-email", json!("stale"));
    state.set_active_groups("deps", ["g1"]);

    let result = validate_all_fields(&dependents_form(), &state, &EngineOptions::new());
    assert!(result.is_valid, "{:?}", result.error_list);
}

#[test]
fn stored_row_objects_are_validated_directly() {
    let mut state = RuntimeState::new();
    state.publish("name", json!("Pat"));
    state.set_group_rows(
        "deps",
        vec![
            json!({"email": "x@y.io", "age": 3}).as_object().cloned().expect("row"),
            json!({"email": "x@y.io", "age": -1}).as_object().cloned().expect("row"),
        ],
    );

    let result = validate_all_fields(&dependents_form(), &state, &EngineOptions::new());
    assert_eq!(
        result.errors.get("age__row_1").map(String::as_str),
        Some("Age must be between 0 and 120.")
    );
    assert_eq!(result.error_count(), 1);
}

#[test]
fn row_predicates_see_row_values() {
    let mut email = FieldNode::leaf("email", "text-input")
        .with_attribute("labelText", "Email")
        .required();
    email.custom_visibility = Some("formState.contact === 'email'".to_string());
    let items = vec![
        FieldNode::container("people", vec![FieldNode::leaf("contact", "select"), email]).repeatable(),
    ];

    let mut state = RuntimeState::new();
    state.publish("people-a-contact", json!("phone"));
    state.publish("people-b-contact", json!("email"));

    let result = validate_all_fields(&items, &state, &EngineOptions::new());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors.contains_key("email__row_1"));
    assert_eq!(result.error_list, vec!["people #2: Email - is required."]);
}

#[test]
fn nested_rows_extend_key_and_path() {
    let items = vec![
        FieldNode::container(
            "c1",
            vec![
                FieldNode::leaf("f1", "text"),
                FieldNode::container("n1", vec![FieldNode::leaf("x", "text").required()])
                    .repeatable()
                    .with_attribute("legend", "Items"),
            ],
        )
        .repeatable()
        .with_attribute("legend", "Orders"),
    ];

    let mut state = RuntimeState::new();
    state.publish("c1-g1-f1", json!("A"));
    state.publish("c1-g2-f1", json!("B"));
    state.publish("c1-g2-n1-r1-x", json!("filled"));
    state.publish("c1-g2-n1-r2-x", json!(""));

    let options = EngineOptions::new().with_default_label("Entry");
    let result = validate_all_fields(&items, &state, &options);

    assert_eq!(
        result.errors.get("x__row_1_1").map(String::as_str),
        Some("Entry is required.")
    );
    assert_eq!(result.error_list, vec!["Orders #2 > Items #2: Entry - is required."]);
}

#[test]
fn plain_containers_add_their_legend() {
    let items = vec![FieldNode::container(
        "contact",
        vec![FieldNode::leaf("phone", "text")
            .with_attribute("labelText", "Phone")
            .with_attribute("maskType", "phone")],
    )
    .with_attribute("legend", "Contact")];

    let mut state = RuntimeState::new();
    state.publish("phone", json!("555-12"));

    let result = validate_all_fields(&items, &state, &EngineOptions::new());
    assert_eq!(result.error_list, vec!["Contact: Phone - must have 10 digits."]);
}

#[test]
fn plain_containers_inside_rows_add_their_legend() {
    let items = vec![
        FieldNode::container(
            "members",
            vec![
                FieldNode::leaf("who", "text").with_attribute("labelText", "Name"),
                FieldNode::container(
                    "address",
                    vec![FieldNode::leaf("postcode", "text")
                        .with_attribute("labelText", "Postcode")
                        .required()],
                )
                .with_attribute("legend", "Address"),
            ],
        )
        .repeatable()
        .with_attribute("legend", "Members"),
    ];

    let mut state = RuntimeState::new();
    state.publish("members-g1-who", json!("Ann"));
    state.publish("members-g1-postcode", json!(""));

    let result = validate_all_fields(&items, &state, &EngineOptions::new());
    assert_eq!(
        result.errors.get("postcode__row_0").map(String::as_str),
        Some("Postcode is required.")
    );
    assert_eq!(
        result.error_list,
        vec!["Members #1 > Address: Postcode - is required."]
    );
}

#[test]
fn bound_values_stand_in_for_empty_state() {
    let items = vec![
        FieldNode::leaf("code", "text")
            .with_attribute("labelText", "Code")
            .with_attribute("value", "ABC")
            .required(),
    ];
    let mut state = RuntimeState::new();
    state.publish("code", json!(null));

    assert!(validate_all_fields(&items, &state, &EngineOptions::new()).is_valid);
}
