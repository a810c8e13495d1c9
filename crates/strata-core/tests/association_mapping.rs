use pretty_assertions::assert_eq;
use std_util::prelude::*;
use strata_core::mapping::{AssociationKind, AssociationMapping, Cascade, JoinColumn, JoinTable};
use strata_core::{map, MappingArray, Value};

fn picture_file() -> MappingArray {
    map! {
        "type" => 2,
        "fieldName" => "file",
        "sourceEntity" => "Picture",
        "targetEntity" => "File",
        "cascade" => vec![Value::from("persist")],
        "joinColumns" => vec![Value::Map(map! {
            "name" => "file_id",
            "referencedColumnName" => "file_id",
        })],
    }
}

#[test]
fn builds_many_to_one_from_mapping_array() {
    let mapping = assert_ok!(AssociationMapping::from_mapping_array(&picture_file()));

    assert_eq!(mapping.kind(), AssociationKind::ManyToOne);
    assert_eq!(mapping.field_name(), "file");
    assert!(mapping.is_owning_side());
    assert!(mapping.is_cascade_persist());
    assert!(!mapping.is_cascade_remove());
    assert_eq!(mapping.join_columns(), [JoinColumn::new("file_id", "file_id")]);
}

#[test]
fn flat_map_round_trips() {
    let mut raw = picture_file();
    raw.insert("inversedBy".into(), Value::Null);
    raw.insert("fetch".into(), Value::from("EAGER"));

    let mapping = assert_ok!(AssociationMapping::from_mapping_array(&raw));
    let flat = mapping.to_flat_map();

    // Explicit nulls survive flattening, never-assigned keys do not.
    assert_eq!(flat.get("inversedBy"), Some(&Value::Null));
    assert_none!(flat.get("mappedBy"));
    assert_eq!(flat.get("isCascadePersist"), Some(&Value::Bool(true)));

    let back = assert_ok!(AssociationMapping::from_mapping_array(&flat));
    assert_eq!(back, mapping);
    assert_eq!(back.to_flat_map(), flat);
}

#[test]
fn many_to_many_round_trips_with_join_table() {
    let mut table = JoinTable::new("user_group");
    table.join_columns.push(JoinColumn::new("user_id", "id").on_delete("CASCADE"));
    table.inverse_join_columns.push(JoinColumn::new("group_id", "id"));

    let mut mapping =
        AssociationMapping::new(AssociationKind::ManyToMany, "groups", "User", "Group");
    assert_ok!(mapping.set_join_table(table.clone()));
    mapping.set_cascade(vec![Cascade::All]);

    let back = assert_ok!(AssociationMapping::from_mapping_array(&mapping.to_flat_map()));
    assert_eq!(back.join_table(), Some(&table));
    assert!(back.is_cascade_detach());
    assert_eq!(back, mapping);
}

#[test]
fn unknown_key_is_rejected_naming_the_subtype() {
    let mut raw = picture_file();
    raw.insert("fetchMode".into(), Value::from("LAZY"));

    let err = assert_err!(AssociationMapping::from_mapping_array(&raw));
    assert!(err.is_unknown_mapping_property());
    assert_eq!(
        err.to_string(),
        "unknown mapping property `fetchMode` on ManyToOneAssociationMapping"
    );
}

#[test]
fn join_table_is_only_legal_on_many_to_many() {
    let mut raw = picture_file();
    raw.insert("joinTable".into(), Value::Map(map! { "name" => "picture_file" }));

    let err = assert_err!(AssociationMapping::from_mapping_array(&raw));
    assert!(err.is_invalid_mapping());
    assert!(err.to_string().contains("ManyToOneAssociationMapping"));
}

#[test]
fn null_or_empty_join_table_is_absent() {
    for value in [Value::Null, Value::Map(map! {})] {
        let raw = map! {
            "type" => 8,
            "fieldName" => "groups",
            "sourceEntity" => "User",
            "targetEntity" => "Group",
            "joinTable" => value,
        };

        let mapping = assert_ok!(AssociationMapping::from_mapping_array(&raw));
        assert_none!(mapping.join_table());
        assert!(!mapping.contains("joinTable"));
    }
}

#[test]
fn null_join_columns_are_absent() {
    let mut raw = picture_file();
    raw.insert("joinColumns".into(), Value::Null);

    let mapping = assert_ok!(AssociationMapping::from_mapping_array(&raw));
    assert_empty!(mapping.join_columns());
    assert!(!mapping.contains("joinColumns"));
}

#[test]
fn join_columns_on_to_many_are_rejected() {
    let raw = map! {
        "type" => 4,
        "fieldName" => "pictures",
        "sourceEntity" => "File",
        "targetEntity" => "Picture",
        "mappedBy" => "file",
        "joinColumns" => vec![Value::Map(map! {
            "name" => "file_id",
            "referencedColumnName" => "id",
        })],
    };

    let err = assert_err!(AssociationMapping::from_mapping_array(&raw));
    assert!(err.is_unknown_mapping_property());
}

#[test]
fn missing_mandatory_key() {
    let mut raw = picture_file();
    raw.shift_remove("targetEntity");

    let err = assert_err!(AssociationMapping::from_mapping_array(&raw));
    assert!(err.is_invalid_mapping());
}

#[test]
fn indexed_access_distinguishes_unset_from_null() {
    let mut mapping = assert_ok!(AssociationMapping::from_mapping_array(&picture_file()));

    assert_eq!(assert_ok!(mapping.get("unique")), None);
    assert!(!mapping.contains("unique"));
    assert_ok!(mapping.set("unique", Value::Null));
    assert_eq!(assert_ok!(mapping.get("unique")), Some(Value::Null));
    assert!(mapping.contains("unique"));

    assert!(mapping.contains("cascade"));
    assert_ok!(mapping.unset("cascade"));
    assert!(!mapping.contains("cascade"));
    assert!(!mapping.is_cascade_persist());

    assert!(mapping.contains("isOwningSide"));
    assert!(assert_err!(mapping.unset("isOwningSide")).is_invalid_mapping());

    assert!(!mapping.contains("nope"));
    assert!(assert_err!(mapping.get("nope")).is_unknown_mapping_property());
}
