//! Tests for kiln-model types.

use kiln_model::{
    FieldKind, FormDefinition, FormTemplate, GroupShape, RuntimeState, classify_group, find_node,
};
use serde_json::json;

const DEFINITION: &str = r#"{
    "id": "def-1",
    "form_id": "CF0001",
    "title": "Household",
    "version": 2,
    "data": {
        "items": [
            {"uuid": "name", "type": "text-input", "attributes": {"labelText": "Name"}, "is_required": true},
            {
                "uuid": "kids",
                "type": "container",
                "attributes": {"isRepeatable": true, "legend": "Children"},
                "children": [
                    {"uuid": "kid-name", "type": "text-input"},
                    {"uuid": "kid-dob", "type": "date-picker"}
                ]
            }
        ]
    },
    "ministry_id": 7
}"#;

#[test]
fn definition_round_trips_unknown_keys() {
    let def = FormDefinition::from_json_str(DEFINITION).expect("parse definition");
    assert_eq!(def.form_id.as_deref(), Some("CF0001"));
    assert_eq!(def.extra.get("ministry_id"), Some(&json!(7)));

    let items = def.items().expect("items");
    assert_eq!(items.len(), 2);
    assert!(items[1].is_repeatable());
    assert_eq!(items[1].legend(), "Children");

    let dob = find_node(items, "kid-dob").expect("find nested node");
    assert_eq!(dob.kind(), FieldKind::Date);

    let back = serde_json::to_value(&def).expect("serialize definition");
    assert_eq!(back["ministry_id"], 7);
    assert_eq!(back["data"]["items"][0]["is_required"], true);
}

#[test]
fn template_keeps_items_and_defaults_audit_fields() {
    let def = FormDefinition::from_json_str(DEFINITION).expect("parse definition");
    let template = FormTemplate::from_definition(&def).expect("template");
    let json = serde_json::to_value(&template).expect("serialize template");
    assert_eq!(json["id"], "def-1");
    assert_eq!(json["version"], 2);
    assert_eq!(json["status"], "");
    assert_eq!(json["created_by"], "");
    assert_eq!(json["form_id"], "CF0001");
    assert_eq!(json["data"]["items"][1]["uuid"], "kids");
}

#[test]
fn runtime_state_parses_mixed_group_lists() {
    let state = RuntimeState::from_value(json!({
        "formState": {"kids-g1-kid-name": "Ada"},
        "groupState": {"kids": ["g1"], "pets": [{"pet": "cat"}, "stray"]},
        "activeGroups": {"kids": ["g1"]}
    }))
    .expect("parse state");

    assert_eq!(classify_group(state.group("kids")), GroupShape::Ids(vec!["g1"]));
    let GroupShape::Rows(rows) = classify_group(state.group("pets")) else {
        panic!("expected rows");
    };
    assert_eq!(rows[0].get("pet"), Some(&json!("cat")));
    assert_eq!(state.active("kids"), Some(["g1".to_string()].as_slice()));
    assert_eq!(state.active("pets"), None);
}
