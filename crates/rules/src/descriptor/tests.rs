use std::time::Duration;

use serde_json::json;

use super::{ActionKind, RuleDescriptor};
use crate::error::RuleError;

// -- decoding ----------------------------------------------------------

#[test]
fn decode_full_descriptor() {
    let raw = br#"{
        "action": "delete_project",
        "periodic": "random(5,10)",
        "minInterval": "1m",
        "timeout": "30s",
        "args": {"projectId": 7}
    }"#;
    let desc = RuleDescriptor::from_json(raw).unwrap();

    assert_eq!(desc.action, ActionKind::DeleteProject);
    assert_eq!(desc.periodic, "random(5,10)");
    assert_eq!(desc.min_interval, Some(Duration::from_secs(60)));
    assert_eq!(desc.timeout, Some(Duration::from_secs(30)));
    assert_eq!(desc.args, json!({"projectId": 7}));
    assert!(desc.is_periodic());
}

#[test]
fn decode_minimal_descriptor_is_one_shot() {
    let desc = RuleDescriptor::from_json(br#"{"action": "create_project"}"#).unwrap();

    assert_eq!(desc.action, ActionKind::CreateProject);
    assert!(!desc.is_periodic());
    assert_eq!(desc.min_interval, None);
    assert_eq!(desc.timeout, None);
    assert!(desc.args.is_null());
}

#[test]
fn decode_accepts_capitalised_field_names() {
    let raw = br#"{"Act": "global_rules", "Periodic": "random(1,2)", "Args": {"UpdateInterval": "10s"}}"#;
    let desc = RuleDescriptor::from_json(raw).unwrap();

    assert_eq!(desc.action, ActionKind::GlobalRules);
    assert_eq!(desc.periodic, "random(1,2)");
    assert_eq!(desc.args, json!({"UpdateInterval": "10s"}));
}

#[test]
fn decode_empty_durations_are_unset() {
    let raw = br#"{"action": "create_project", "minInterval": "", "timeout": null}"#;
    let desc = RuleDescriptor::from_json(raw).unwrap();
    assert_eq!(desc.min_interval, None);
    assert_eq!(desc.timeout, None);
}

#[test]
fn decode_unknown_action_is_preserved() {
    let desc = RuleDescriptor::from_json(br#"{"action": "rotate_keys"}"#).unwrap();
    assert_eq!(desc.action, ActionKind::Other("rotate_keys".to_string()));
    assert_eq!(desc.action.to_string(), "rotate_keys");
}

#[test]
fn decode_bad_duration_is_malformed_expression() {
    let err = RuleDescriptor::from_json(br#"{"action": "create_project", "timeout": "soon"}"#)
        .unwrap_err();
    assert!(
        matches!(err, RuleError::MalformedExpression { ref expr, .. } if expr == "soon"),
        "{err}"
    );

    let err = RuleDescriptor::from_json(br#"{"action": "create_project", "minInterval": "1.5x"}"#)
        .unwrap_err();
    assert!(matches!(err, RuleError::MalformedExpression { .. }), "{err}");
}

#[test]
fn decode_bad_yaml_duration_is_malformed_expression() {
    let err = RuleDescriptor::from_yaml("action: create_project\nMinInterval: 3 days\n").unwrap_err();
    assert!(matches!(err, RuleError::MalformedExpression { .. }), "{err}");
}

#[test]
fn decode_fractional_durations() {
    let raw = br#"{"action": "create_project", "minInterval": "1.5s", "timeout": "0.5m"}"#;
    let desc = RuleDescriptor::from_json(raw).unwrap();
    assert_eq!(desc.min_interval, Some(Duration::from_millis(1_500)));
    assert_eq!(desc.timeout, Some(Duration::from_secs(30)));
}

#[test]
fn decode_missing_action_fails() {
    let err = RuleDescriptor::from_json(br#"{"periodic": "random(1,2)"}"#).unwrap_err();
    assert!(matches!(err, RuleError::Descriptor(_)));
}

// -- encoding ----------------------------------------------------------

#[test]
fn encode_uses_wire_field_names() {
    let desc = RuleDescriptor::new(ActionKind::DeleteProject)
        .with_periodic("random(5,10)")
        .with_min_interval(Duration::from_millis(1_500))
        .with_args(json!({"projectId": 1}));

    let value: serde_json::Value = serde_json::from_slice(&desc.to_json().unwrap()).unwrap();
    assert_eq!(
        value,
        json!({
            "action": "delete_project",
            "periodic": "random(5,10)",
            "minInterval": "1500ms",
            "args": {"projectId": 1},
        })
    );
}

#[test]
fn whitespace_only_periodic_is_one_shot() {
    let desc = RuleDescriptor::new(ActionKind::CreateProject).with_periodic("   ");
    assert!(!desc.is_periodic());
}

// -- files -------------------------------------------------------------

#[test]
fn read_yaml_descriptor_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("root.yml");
    std::fs::write(
        &path,
        "action: global_rules\nperiodic: random(1,2)\nargs:\n  updateInterval: 10s\n",
    )
    .unwrap();

    let desc = RuleDescriptor::from_file(&path).unwrap();
    assert_eq!(desc.action, ActionKind::GlobalRules);
    assert_eq!(desc.periodic, "random(1,2)");
    assert_eq!(desc.args, json!({"updateInterval": "10s"}));
}

#[test]
fn read_json_descriptor_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("root.json");
    std::fs::write(&path, r#"{"action": "create_project", "timeout": "5s"}"#).unwrap();

    let desc = RuleDescriptor::from_file(&path).unwrap();
    assert_eq!(desc.action, ActionKind::CreateProject);
    assert_eq!(desc.timeout, Some(Duration::from_secs(5)));
}

#[test]
fn missing_descriptor_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RuleDescriptor::from_file(&dir.path().join("absent.yml")).unwrap_err();
    assert!(matches!(err, RuleError::Io(_)));
}

#[test]
fn action_kind_parses_like_it_decodes() {
    for name in ["create_project", "delete_project", "global_rules", "rotate_keys"] {
        let parsed: ActionKind = name.parse().unwrap();
        assert_eq!(parsed, ActionKind::from(name.to_string()));
        assert_eq!(parsed.as_str(), name);
    }
    assert_eq!("global_rules".parse::<ActionKind>().unwrap(), ActionKind::GlobalRules);
}
