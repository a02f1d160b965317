//! Subcommands driven from JSON files.

use std::fs;
use std::path::{Path, PathBuf};

use kiln_cli::commands::{run_bind, run_normalize, run_save, run_validate};
use kiln_cli::io::{load_object, write_json};
use kiln_model::{EngineOptions, FormMode, GroupSlot};
use serde_json::{Value, json};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}

fn definition() -> Value {
    json!({
        "id": "form-1",
        "form_id": "household",
        "data": {"items": [
            {"uuid": "applicant", "type": "text-input",
             "attributes": {"labelText": "Applicant"}, "is_required": true},
            {"uuid": "c1", "type": "container",
             "attributes": {"isRepeatable": true, "legend": "Members"},
             "children": [
                {"uuid": "f1", "type": "text-input",
                 "attributes": {"labelText": "Name", "maxLength": 3}}
             ]}
        ]}
    })
}

#[test]
fn validate_reports_row_errors() {
    let dir = TempDir::new().unwrap();
    let definition = write(dir.path(), "definition.json", &definition());
    let state = write(
        dir.path(),
        "state.json",
        &json!({
            "formState": {"applicant": "Pat", "c1-g1-f1": "Al", "c1-g2-f1": "Bartholomew"},
            "groupState": {"c1": ["g1", "g2"]}
        }),
    );

    let result = run_validate(&definition, &state, &EngineOptions::new()).unwrap();
    assert!(!result.is_valid);
    assert_eq!(
        result.error_list,
        vec!["Members #2: Name - must be at most 3 characters."]
    );
}

#[test]
fn normalize_materializes_rows() {
    let dir = TempDir::new().unwrap();
    let definition = write(dir.path(), "definition.json", &definition());
    let state = write(
        dir.path(),
        "state.json",
        &json!({
            "formState": {"c1-g1-f1": "A", "c1-g2-f1": "B"},
            "activeGroups": {"c1": ["g2", "g1"]}
        }),
    );

    let normalized = run_normalize(&definition, &state).unwrap();
    let rows: Vec<&GroupSlot> = normalized.group("c1").iter().collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].as_row().and_then(|row| row.get("f1")), Some(&json!("B")));

    insta::assert_json_snapshot!(normalized, @r#"
    {
      "formState": {
        "c1-g1-f1": "A",
        "c1-g2-f1": "B"
      },
      "groupState": {
        "c1": [
          {
            "f1": "B"
          },
          {
            "f1": "A"
          }
        ]
      },
      "activeGroups": {
        "c1": [
          "g2",
          "g1"
        ]
      }
    }
    "#);
}

#[test]
fn save_is_blocked_by_invalid_forms() {
    let dir = TempDir::new().unwrap();
    let definition = write(dir.path(), "definition.json", &definition());
    let state = write(dir.path(), "state.json", &json!({"formState": {"c1-g1-f1": "A"}}));

    let outcome = run_save(&definition, &state, None, &EngineOptions::new(), true).unwrap();
    assert!(outcome.payload.is_none());
    assert_eq!(
        outcome.validation.map(|result| result.error_list),
        Some(vec!["Applicant - is required.".to_string()])
    );

    let outcome = run_save(&definition, &state, None, &EngineOptions::new(), false).unwrap();
    let payload = outcome.payload.expect("payload");
    assert_eq!(payload.data["c1"], json!([{"f1": "A"}]));
}

#[test]
fn save_merges_metadata_and_writes_payload() {
    let dir = TempDir::new().unwrap();
    let definition = write(dir.path(), "definition.json", &definition());
    let state = write(
        dir.path(),
        "state.json",
        &json!({"formState": {"applicant": "Pat", "c1-g1-f1": "A"}}),
    );
    let metadata = write(dir.path(), "metadata.json", &json!({"office": "North"}));

    let outcome = run_save(
        &definition,
        &state,
        Some(&metadata),
        &EngineOptions::new(),
        true,
    )
    .unwrap();
    let payload = outcome.payload.expect("payload");
    assert_eq!(payload.metadata["office"], json!("North"));
    assert!(payload.metadata.contains_key("updated_date"));
    assert_eq!(payload.form_definition.id, json!("form-1"));

    let output = dir.path().join("payload.json");
    write_json(Some(&output), &payload).unwrap();
    let written = load_object(&output).unwrap();
    assert_eq!(written["data"]["applicant"], json!("Pat"));
}

#[test]
fn bind_applies_read_only_mode() {
    let dir = TempDir::new().unwrap();
    let definition = write(dir.path(), "definition.json", &definition());
    let data = write(dir.path(), "data.json", &json!({"applicant": "Pat", "c1": [{"f1": "A"}]}));

    let bound = run_bind(&definition, &data, FormMode::PortalView).unwrap();
    let items = bound.definition.items().unwrap();
    assert_eq!(items[0].value, Some(json!("Pat")));
    assert_eq!(items[0].is_read_only, Some(json!(true)));
    assert_eq!(bound.debug["c1"], json!("[repeater] 1 rows"));
}

#[test]
fn non_object_metadata_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "metadata.json", &json!([1, 2]));
    let error = load_object(&path).unwrap_err();
    assert!(error.to_string().contains("must contain a JSON object"));
}

#[test]
fn missing_items_is_an_error() {
    let dir = TempDir::new().unwrap();
    let definition = write(dir.path(), "definition.json", &json!({"form_id": "empty"}));
    let state = write(dir.path(), "state.json", &json!({}));
    let error = run_validate(&definition, &state, &EngineOptions::new()).unwrap_err();
    assert!(error.to_string().contains("neither data.items nor elements"));
}
