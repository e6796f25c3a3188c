// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::too_many_lines)] // Test fixtures

//! Polymorphic fields: structural and tagged dispatch over record subtypes.

use chrono::NaiveDate;
use recast::{
    ConvertError, DecodeError, DiscriminatorSpec, EncodeError, Error, Instance, Native, Options,
    RecordType, Registry, TypeDescriptor, Value,
};

const DT_STR: &str = "2023-05-30";

fn dt_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 5, 30).unwrap()
}

fn payload(tag: &str) -> Value {
    Value::map([("x", DT_STR), ("type", tag)])
}

fn variant(record: &str, x: impl Into<Native>, tag: &str) -> Native {
    Native::Record(Instance::new(record).with("x", x).with("type", tag))
}

fn str_variant(record: &str, tag: &str) -> Native {
    variant(record, DT_STR, tag)
}

fn date_variant(record: &str, tag: &str) -> Native {
    variant(record, dt_date(), tag)
}

fn declare_variant(registry: &Registry, name: &str, base: &str, x: TypeDescriptor, tag: &str) {
    registry
        .declare(
            RecordType::builder(name)
                .extends(base)
                .field("x", x)
                .field_with_default("type", TypeDescriptor::literal([tag]), tag)
                .build(),
        )
        .unwrap();
}

fn poly(base: &str, spec: DiscriminatorSpec) -> TypeDescriptor {
    TypeDescriptor::polymorphic(base, spec)
}

fn variants() -> Registry {
    let registry = Registry::new();
    registry.declare(RecordType::builder("BaseVariant").build()).unwrap();
    declare_variant(&registry, "VariantStr1", "BaseVariant", TypeDescriptor::str(), "str_1");
    declare_variant(&registry, "VariantDate1", "BaseVariant", TypeDescriptor::date(), "date_1");
    declare_variant(&registry, "VariantStr12", "VariantStr1", TypeDescriptor::str(), "str_12");
    declare_variant(&registry, "VariantDate12", "VariantStr1", TypeDescriptor::date(), "date_12");
    declare_variant(&registry, "VariantStr21", "VariantDate1", TypeDescriptor::str(), "str_21");
    declare_variant(&registry, "VariantDate22", "VariantDate1", TypeDescriptor::date(), "date_22");

    let subtypes = DiscriminatorSpec::new().include_subtypes();
    let supertypes = DiscriminatorSpec::new().include_supertypes();
    let both = DiscriminatorSpec::new().include_subtypes().include_supertypes();

    let owners = [
        RecordType::builder("BySubtypes")
            .field("x", poly("BaseVariant", subtypes.clone()))
            .build(),
        RecordType::builder("BySupertypes")
            .field("x", poly("BaseVariant", supertypes.clone()))
            .field("x1", poly("VariantStr1", supertypes.clone()))
            .field("x2", poly("VariantDate1", supertypes.clone()))
            .build(),
        RecordType::builder("ByFieldWithSubtypes")
            .field("x", poly("BaseVariant", subtypes.field("type")))
            .build(),
        RecordType::builder("ByFieldWithSupertypes")
            .field("x1", poly("VariantStr1", supertypes.clone().field("type")))
            .field("x2", poly("VariantDate1", supertypes.field("type")))
            .build(),
        RecordType::builder("ByFieldWithSupertypesAndSubtypes")
            .field("x1", poly("VariantStr1", both.clone().field("type")))
            .field("x2", poly("VariantDate1", both.clone().field("type")))
            .build(),
        RecordType::builder("BySupertypesAndSubtypes")
            .field("x1", poly("VariantStr1", both.clone()))
            .field("x2", poly("VariantDate1", both))
            .build(),
    ];
    for owner in owners {
        registry.declare(owner).unwrap();
    }
    registry
}

fn cases() -> Vec<(Value, Native)> {
    vec![
        (payload("str_1"), str_variant("VariantStr1", "str_1")),
        (payload("str_12"), str_variant("VariantStr12", "str_12")),
        (payload("date_12"), date_variant("VariantDate12", "date_12")),
        (payload("date_1"), date_variant("VariantDate1", "date_1")),
        (payload("str_21"), str_variant("VariantStr21", "str_21")),
        (payload("date_22"), date_variant("VariantDate22", "date_22")),
    ]
}

fn decode_x(registry: &Registry, owner: &str, data: Value) -> Result<Native, Error> {
    let decoded = registry.decode(owner, &Value::map([("x", data)]), Options::default())?;
    Ok(decoded.get("x").cloned().unwrap())
}

fn invalid_field(err: Error) -> (String, ConvertError) {
    match err {
        Error::Decode(DecodeError::InvalidFieldValue { field, source, .. }) => (field, source),
        other => panic!("expected InvalidFieldValue, got {:?}", other),
    }
}

// ============================================================================
// Structural and tagged dispatch over subtypes
// ============================================================================

#[test]
fn test_by_subtypes() {
    let registry = variants();
    for (data, expected) in cases() {
        assert_eq!(decode_x(&registry, "BySubtypes", data).unwrap(), expected);
    }
}

#[test]
fn test_by_subtypes_unknown_variant() {
    let registry = variants();
    let err = decode_x(&registry, "BySubtypes", Value::map([("type", "unknown")])).unwrap_err();
    let (field, source) = invalid_field(err);
    assert_eq!(field, "x");
    assert!(matches!(source, ConvertError::NoMatchingVariant { tried: 6, .. }));
}

#[test]
fn test_by_field_with_subtypes() {
    let registry = variants();
    for (data, expected) in cases() {
        assert_eq!(decode_x(&registry, "ByFieldWithSubtypes", data).unwrap(), expected);
    }
}

#[test]
fn test_by_field_with_subtypes_unknown_tag() {
    let registry = variants();
    let err = decode_x(&registry, "ByFieldWithSubtypes", Value::map([("type", "unknown")]))
        .unwrap_err();
    let (field, source) = invalid_field(err);
    assert_eq!(field, "x");
    assert!(matches!(source, ConvertError::UnknownTag { ref field, .. } if field == "type"));

    let err = decode_x(&registry, "ByFieldWithSubtypes", Value::map([("x", DT_STR)])).unwrap_err();
    assert!(matches!(invalid_field(err).1, ConvertError::MissingTag { .. }));
}

#[test]
fn test_tagged_and_structural_agree() {
    let registry = variants();
    for (data, _) in cases() {
        assert_eq!(
            decode_x(&registry, "BySubtypes", data.clone()).unwrap(),
            decode_x(&registry, "ByFieldWithSubtypes", data).unwrap()
        );
    }
}

#[test]
fn test_own_tag_selects_subtype_of_common_ancestor() {
    let registry = variants();
    let decoded = decode_x(&registry, "ByFieldWithSubtypes", payload("date_12")).unwrap();
    let instance = decoded.as_record().unwrap();
    assert_eq!(instance.record(), "VariantDate12");
    assert_eq!(instance.get("x"), Some(&Native::Date(dt_date())));
}

// ============================================================================
// Supertypes
// ============================================================================

fn three(x: Value, x1: Value, x2: Value) -> Value {
    Value::map([("x", x), ("x1", x1), ("x2", x2)])
}

#[test]
fn test_by_supertypes() {
    let registry = variants();
    let expected = Instance::new("BySupertypes")
        .with("x", Native::Record(Instance::new("BaseVariant")))
        .with("x1", str_variant("VariantStr1", "str_1"))
        .with("x2", date_variant("VariantDate1", "date_1"));

    let empty = Value::map(Vec::<(String, Value)>::new());
    let decoded = registry
        .decode(
            "BySupertypes",
            &three(empty.clone(), payload("str_1"), payload("date_1")),
            Options::default(),
        )
        .unwrap();
    assert_eq!(decoded, expected);

    // The declared type ignores keys it does not know.
    let decoded = registry
        .decode(
            "BySupertypes",
            &three(payload("str_1"), payload("str_1"), payload("date_1")),
            Options::default(),
        )
        .unwrap();
    assert_eq!(decoded, expected);

    let err = registry
        .decode(
            "BySupertypes",
            &three(empty.clone(), payload("str_12"), payload("date_1")),
            Options::default(),
        )
        .unwrap_err();
    assert_eq!(invalid_field(err).0, "x1");

    let err = registry
        .decode(
            "BySupertypes",
            &three(empty, payload("str_1"), payload("date_22")),
            Options::default(),
        )
        .unwrap_err();
    assert_eq!(invalid_field(err).0, "x2");
}

#[test]
fn test_by_field_with_supertypes() {
    let registry = variants();
    let pair = |x1: &str, x2: &str| Value::map([("x1", payload(x1)), ("x2", payload(x2))]);

    let decoded = registry
        .decode("ByFieldWithSupertypes", &pair("str_1", "date_1"), Options::default())
        .unwrap();
    assert_eq!(decoded.get("x1"), Some(&str_variant("VariantStr1", "str_1")));
    assert_eq!(decoded.get("x2"), Some(&date_variant("VariantDate1", "date_1")));

    let err = registry
        .decode("ByFieldWithSupertypes", &pair("str_12", "date_1"), Options::default())
        .unwrap_err();
    assert_eq!(invalid_field(err).0, "x1");

    let err = registry
        .decode("ByFieldWithSupertypes", &pair("str_1", "date_22"), Options::default())
        .unwrap_err();
    assert_eq!(invalid_field(err).0, "x2");
}

#[test]
fn test_by_supertypes_and_subtypes() {
    let registry = variants();
    let pair = |x1: &str, x2: &str| Value::map([("x1", payload(x1)), ("x2", payload(x2))]);

    for owner in ["ByFieldWithSupertypesAndSubtypes", "BySupertypesAndSubtypes"] {
        let decode = |x1: &str, x2: &str| registry.decode(owner, &pair(x1, x2), Options::default());

        let decoded = decode("str_1", "date_1").unwrap();
        assert_eq!(decoded.get("x1"), Some(&str_variant("VariantStr1", "str_1")));
        assert_eq!(decoded.get("x2"), Some(&date_variant("VariantDate1", "date_1")));

        let decoded = decode("str_12", "str_21").unwrap();
        assert_eq!(decoded.get("x1"), Some(&str_variant("VariantStr12", "str_12")));
        assert_eq!(decoded.get("x2"), Some(&str_variant("VariantStr21", "str_21")));

        let decoded = decode("date_12", "date_22").unwrap();
        assert_eq!(decoded.get("x1"), Some(&date_variant("VariantDate12", "date_12")));
        assert_eq!(decoded.get("x2"), Some(&date_variant("VariantDate22", "date_22")));

        assert_eq!(invalid_field(decode("date_1", "str_1").unwrap_err()).0, "x1");
        assert_eq!(invalid_field(decode("str_21", "str_12").unwrap_err()).0, "x1");
        assert_eq!(invalid_field(decode("date_22", "date_12").unwrap_err()).0, "x1");
    }
}

// ============================================================================
// Class-level tags and cross-tree dispatch
// ============================================================================

fn foo_tree() -> Registry {
    let registry = Registry::new();
    registry
        .declare(RecordType::builder("Foo1").field("x1", TypeDescriptor::int()).build())
        .unwrap();
    registry
        .declare(
            RecordType::builder("Foo2")
                .extends("Foo1")
                .field("x2", TypeDescriptor::int())
                .build(),
        )
        .unwrap();
    for (name, tag) in [("Foo3", 3), ("Foo4", 4)] {
        registry
            .declare(
                RecordType::builder(name)
                    .extends("Foo2")
                    .field("x", TypeDescriptor::int())
                    .constant("type", tag)
                    .build(),
            )
            .unwrap();
    }
    registry
        .declare(
            RecordType::builder("Bar")
                .field(
                    "baz1",
                    poly("Foo1", DiscriminatorSpec::new().field("type").include_subtypes()),
                )
                .field("baz2", poly("Foo1", DiscriminatorSpec::new().include_subtypes()))
                .build(),
        )
        .unwrap();
    registry
}

fn foo(record: &str, fields: &[(&str, i64)]) -> Native {
    let mut instance = Instance::new(record);
    for (name, value) in fields {
        instance.set(*name, *value);
    }
    Native::Record(instance)
}

#[test]
fn test_subclass_tree_with_class_level_tags() {
    let registry = foo_tree();
    let input = Value::map([("type", 4), ("x1", 1), ("x2", 2), ("x", 42)]);
    let bar = registry
        .decode(
            "Bar",
            &Value::map([("baz1", input.clone()), ("baz2", input)]),
            Options::default(),
        )
        .unwrap();

    assert_eq!(bar.get("baz1"), Some(&foo("Foo4", &[("x1", 1), ("x2", 2), ("x", 42)])));
    // Structural dispatch takes the deepest subtype that accepts the input.
    assert_eq!(bar.get("baz2"), Some(&foo("Foo3", &[("x1", 1), ("x2", 2), ("x", 42)])));
}

#[test]
fn test_structural_falls_back_to_shallower_subtype() {
    let registry = foo_tree();
    let input = Value::map([("x1", 1), ("x2", 2)]);
    let bar = registry
        .decode(
            "Bar",
            &Value::map([
                ("baz1", Value::map([("type", 3), ("x1", 1), ("x2", 2), ("x", 7)])),
                ("baz2", input),
            ]),
            Options::default(),
        )
        .unwrap();
    assert_eq!(bar.get("baz1"), Some(&foo("Foo3", &[("x1", 1), ("x2", 2), ("x", 7)])));
    assert_eq!(bar.get("baz2"), Some(&foo("Foo2", &[("x1", 1), ("x2", 2)])));
}

#[test]
fn test_deepest_match_wins_over_three_levels() {
    let registry = Registry::new();
    let mut base: Option<&str> = None;
    for name in ["L1", "L2", "L3"] {
        let mut builder = RecordType::builder(name)
            .field_with_default("kind", TypeDescriptor::str(), name.to_lowercase().as_str())
            .constant("tag", name.to_lowercase().as_str());
        if let Some(base) = base {
            builder = builder.extends(base);
        }
        registry.declare(builder.build()).unwrap();
        base = Some(name);
    }
    registry
        .declare(
            RecordType::builder("Holder")
                .field(
                    "structural",
                    poly("L1", DiscriminatorSpec::new().include_subtypes().include_supertypes()),
                )
                .field(
                    "tagged",
                    poly(
                        "L1",
                        DiscriminatorSpec::new()
                            .field("tag")
                            .include_subtypes()
                            .include_supertypes(),
                    ),
                )
                .build(),
        )
        .unwrap();

    let holder = registry
        .decode(
            "Holder",
            &Value::map([
                ("structural", Value::map([("kind", "anything")])),
                ("tagged", Value::map([("tag", "l2"), ("kind", "x")])),
            ]),
            Options::default(),
        )
        .unwrap();
    assert_eq!(holder.get("structural").and_then(Native::as_record).map(Instance::record), Some("L3"));
    assert_eq!(holder.get("tagged").and_then(Native::as_record).map(Instance::record), Some("L2"));

    for (tag, record) in [("l3", "L3"), ("l1", "L1")] {
        let holder = registry
            .decode(
                "Holder",
                &Value::map([
                    ("structural", Value::map([("kind", "x")])),
                    ("tagged", Value::map([("tag", tag)])),
                ]),
                Options::default(),
            )
            .unwrap();
        let tagged = holder.get("tagged").and_then(Native::as_record).unwrap();
        assert_eq!(tagged.record(), record);
        assert_eq!(tagged.get("kind"), Some(&Native::from(tag)));
    }
}

// ============================================================================
// Custom tagger
// ============================================================================

#[test]
fn test_custom_variant_tagger() {
    let registry = Registry::new();
    registry
        .declare(RecordType::builder("BaseVariantWitCustomTagger").build())
        .unwrap();
    for name in ["VariantWitCustomTaggerSub1", "VariantWitCustomTaggerSub2"] {
        registry
            .declare(RecordType::builder(name).extends("BaseVariantWitCustomTagger").build())
            .unwrap();
    }
    registry
        .declare(
            RecordType::builder("VariantWitCustomTaggerOwner")
                .field(
                    "x",
                    poly(
                        "BaseVariantWitCustomTagger",
                        DiscriminatorSpec::new()
                            .field("type")
                            .include_subtypes()
                            .tagger(|rt| Value::from(rt.name().to_lowercase())),
                    ),
                )
                .build(),
        )
        .unwrap();

    for (tag, record) in [
        ("variantwitcustomtaggersub1", "VariantWitCustomTaggerSub1"),
        ("variantwitcustomtaggersub2", "VariantWitCustomTaggerSub2"),
    ] {
        let decoded = decode_x(&registry, "VariantWitCustomTaggerOwner", Value::map([("type", tag)]))
            .unwrap();
        assert_eq!(decoded, Native::Record(Instance::new(record)));
    }

    let err = decode_x(&registry, "VariantWitCustomTaggerOwner", Value::map([("type", "unknown")]))
        .unwrap_err();
    assert_eq!(invalid_field(err).0, "x");
}

// ============================================================================
// Encoding
// ============================================================================

#[test]
fn test_encode_follows_instance_type() {
    let registry = variants();
    let owner = Instance::new("BySubtypes").with("x", date_variant("VariantDate22", "date_22"));
    let tree = registry.encode("BySubtypes", &owner, Options::default()).unwrap();
    assert_eq!(tree, Value::map([("x", payload("date_22"))]));

    let stranger = Instance::new("BySubtypes").with("x", Native::Record(Instance::new("Elsewhere")));
    let err = registry.encode("BySubtypes", &stranger, Options::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Encode(EncodeError::InvalidValue { source: ConvertError::NotASubtype { .. }, .. })
    ));
}

#[test]
fn test_discriminator_needs_a_direction() {
    let registry = variants();
    registry
        .declare(
            RecordType::builder("Aimless")
                .field("x", poly("BaseVariant", DiscriminatorSpec::new().field("type")))
                .build(),
        )
        .unwrap();
    let err = registry.codec("Aimless").unwrap_err();
    assert!(err
        .to_string()
        .contains("either include_subtypes or include_supertypes must be enabled"));
}
