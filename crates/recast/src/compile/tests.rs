// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::config::{Dialect, NativeKind, Options};
use crate::error::{ConvertError, DecodeError, EncodeError, Error, SchemaError};
use crate::native::{EnumMember, Instance, Native, NativeSet, PathFlavor, PathValue};
use crate::registry::Registry;
use crate::types::{ContainerKind, EnumType, FieldDecl, RecordType, TypeDescriptor};
use crate::value::Value;
use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeDelta, TimeZone};
use num_rational::Ratio;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

fn single(ty: TypeDescriptor) -> Registry {
    let registry = Registry::new();
    registry
        .declare(RecordType::builder("R").field("v", ty).build())
        .unwrap();
    registry
}

fn encode(registry: &Registry, value: impl Into<Native>, opts: Options) -> Value {
    let instance = Instance::new("R").with("v", value);
    let tree = registry.encode("R", &instance, opts).unwrap();
    tree.get("v").cloned().unwrap()
}

fn decode(registry: &Registry, raw: impl Into<Value>, opts: Options) -> Result<Native, Error> {
    let tree = Value::map([("v", raw.into())]);
    registry
        .decode("R", &tree, opts)
        .map(|instance| instance.get("v").cloned().unwrap())
}

fn schema_error(ty: TypeDescriptor) -> SchemaError {
    match single(ty).codec("R") {
        Err(e) => e,
        Ok(codec) => panic!("expected a schema error, compiled {:?}", codec),
    }
}

#[test]
fn test_numeric_coercion() {
    let ints = single(TypeDescriptor::int());
    assert_eq!(decode(&ints, "42", Options::new()).unwrap(), Native::Int(42));
    assert_eq!(decode(&ints, 3.9, Options::new()).unwrap(), Native::Int(3));
    assert!(decode(&ints, "4x", Options::new()).is_err());

    let floats = single(TypeDescriptor::float());
    assert_eq!(encode(&floats, 2, Options::new()), Value::Float(2.0));
    assert_eq!(decode(&floats, "1.25", Options::new()).unwrap(), Native::Float(1.25));
}

#[test]
fn test_strings_and_bools_are_shape_checked() {
    let strings = single(TypeDescriptor::str());
    assert!(decode(&strings, 1, Options::new()).is_err());
    let bools = single(TypeDescriptor::bool());
    assert!(decode(&bools, "true", Options::new()).is_err());
    assert_eq!(decode(&bools, false, Options::new()).unwrap(), Native::Bool(false));
}

#[test]
fn test_bytes_base64_or_raw() {
    let registry = single(TypeDescriptor::bytes());
    let payload = vec![0u8, 1, 2, 250];

    assert_eq!(encode(&registry, payload.clone(), Options::new()), Value::from("AAEC+g=="));
    assert_eq!(
        encode(&registry, payload.clone(), Options::new().with_bytes(true)),
        Value::Bytes(payload.clone())
    );
    assert_eq!(
        decode(&registry, "AAEC+g==", Options::new()).unwrap(),
        Native::Bytes(payload.clone())
    );
    assert_eq!(
        decode(&registry, Value::Bytes(payload.clone()), Options::new()).unwrap(),
        Native::Bytes(payload)
    );
    assert!(decode(&registry, "not base64!", Options::new()).is_err());
}

#[test]
fn test_sets_collapse_duplicates() {
    let registry = single(TypeDescriptor::frozenset(TypeDescriptor::int()));
    let decoded = decode(&registry, Value::seq([1, 2, 2, 1]), Options::new()).unwrap();
    let expected: NativeSet = [Native::Int(2), Native::Int(1)].into_iter().collect();
    assert_eq!(decoded, Native::Set(expected));

    let lists = single(TypeDescriptor::tuple(TypeDescriptor::int()));
    assert_eq!(
        decode(&lists, Value::seq([1, 1]), Options::new()).unwrap(),
        Native::Seq(vec![Native::Int(1), Native::Int(1)])
    );
}

#[test]
fn test_mapping_keys_are_stringified_and_parsed_back() {
    let registry = single(TypeDescriptor::mapping(
        TypeDescriptor::int(),
        TypeDescriptor::list(TypeDescriptor::str()),
    ));
    let value = Native::Map(vec![(
        Native::Int(7),
        Native::Seq(vec![Native::from("a")]),
    )]);
    let tree = encode(&registry, value.clone(), Options::new());
    assert_eq!(tree, Value::map([("7", Value::seq(["a"]))]));
    assert_eq!(decode(&registry, tree, Options::new()).unwrap(), value);
}

#[test]
fn test_chain_map_layers() {
    let registry = single(TypeDescriptor::chain_map(TypeDescriptor::str(), TypeDescriptor::int()));
    let value = Native::ChainMap(vec![
        vec![(Native::from("a"), Native::Int(1))],
        vec![(Native::from("a"), Native::Int(2)), (Native::from("b"), Native::Int(3))],
    ]);
    let tree = encode(&registry, value.clone(), Options::new());
    assert_eq!(
        tree,
        Value::seq([
            Value::map([("a", 1)]),
            Value::map([("a", 2), ("b", 3)]),
        ])
    );
    assert_eq!(decode(&registry, tree, Options::new()).unwrap(), value);
}

#[test]
fn test_literal_membership() {
    let registry = single(TypeDescriptor::literal(["on", "off"]));
    assert_eq!(decode(&registry, "on", Options::new()).unwrap(), Native::from("on"));
    let err = decode(&registry, "dim", Options::new()).unwrap_err();
    let Error::Decode(DecodeError::InvalidFieldValue { source, .. }) = err else {
        panic!("invalid field value expected");
    };
    assert!(matches!(source, ConvertError::NotAllowed { .. }));

    let instance = Instance::new("R").with("v", "dim");
    assert!(matches!(
        registry.encode("R", &instance, Options::new()),
        Err(Error::Encode(EncodeError::InvalidValue { .. }))
    ));
}

#[test]
fn test_enum_by_value_or_passthrough() {
    let color = Arc::new(EnumType::new("Color").member("RED", "red").member("BLUE", "blue"));
    let registry = single(TypeDescriptor::Enum(Arc::clone(&color)));
    let blue = color.get("BLUE").unwrap();

    assert_eq!(encode(&registry, blue.clone(), Options::new()), Value::from("blue"));
    let kept = encode(&registry, blue.clone(), Options::new().with_enum(true));
    assert_eq!(kept, Value::Native(Box::new(Native::Enum(blue.clone()))));
    assert_eq!(
        decode(&registry, kept, Options::new().with_enum(true)).unwrap(),
        Native::Enum(blue.clone())
    );
    assert_eq!(decode(&registry, "blue", Options::new()).unwrap(), Native::Enum(blue));
    assert!(decode(&registry, "green", Options::new()).is_err());

    let other = EnumMember {
        enum_name: Arc::from("Shade"),
        name: Arc::from("DARK"),
        value: Value::from("dark"),
    };
    let instance = Instance::new("R").with("v", other);
    assert!(registry.encode("R", &instance, Options::new()).is_err());
}

#[test]
fn test_path_decodes_to_concrete_flavor() {
    let registry = single(TypeDescriptor::Path(PathFlavor::PurePosixPath));
    let decoded = decode(&registry, "/tmp/a.txt", Options::new()).unwrap();
    assert_eq!(
        decoded,
        Native::Path(PathValue::new(PathFlavor::PurePosixPath, "/tmp/a.txt"))
    );
    assert_eq!(encode(&registry, decoded, Options::new()), Value::from("/tmp/a.txt"));

    let generic = single(TypeDescriptor::Path(PathFlavor::PathLike));
    assert_eq!(
        decode(&generic, "a/b", Options::new()).unwrap(),
        Native::Path(PathValue::new(PathFlavor::PurePath, "a/b"))
    );
}

#[test]
fn test_temporal_text_and_passthrough() {
    let registry = single(TypeDescriptor::date());
    let day = NaiveDate::from_ymd_opt(2023, 5, 30).unwrap();
    assert_eq!(encode(&registry, day, Options::new()), Value::from("2023-05-30"));
    assert_eq!(
        encode(&registry, day, Options::new().with_datetime(true)),
        Value::Native(Box::new(Native::Date(day)))
    );
    assert_eq!(decode(&registry, "2023-05-30", Options::new()).unwrap(), Native::Date(day));

    let times = single(TypeDescriptor::time());
    let t = NaiveTime::from_hms_micro_opt(8, 30, 0, 250).unwrap();
    assert_eq!(encode(&times, t, Options::new()), Value::from("08:30:00.000250"));

    let stamps = single(TypeDescriptor::datetime());
    let aware = FixedOffset::east_opt(3 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
        .unwrap();
    let text = encode(&stamps, aware, Options::new());
    assert_eq!(text, Value::from("2024-01-02T03:04:05+03:00"));
    assert_eq!(decode(&stamps, text, Options::new()).unwrap(), Native::DateTimeTz(aware));
}

#[test]
fn test_named_and_custom_date_parsers() {
    let registry = Registry::new();
    registry
        .declare(
            RecordType::builder("Stamped")
                .decl(FieldDecl::new("mail", TypeDescriptor::datetime()).meta("deserialize", "rfc2822"))
                .decl(
                    FieldDecl::new("day", TypeDescriptor::optional(TypeDescriptor::date()))
                        .meta_parser("deserialize", |s: &str| {
                            let (d, m, y) = (&s[0..2], &s[3..5], &s[6..]);
                            let day = NaiveDate::from_ymd_opt(y.parse()?, m.parse()?, d.parse()?)
                                .ok_or("no such day")?;
                            Ok(Native::Date(day))
                        }),
                )
                .build(),
        )
        .unwrap();

    let tree = Value::map([
        ("mail", Value::from("Tue, 30 May 2023 10:00:00 +0000")),
        ("day", Value::from("30.05.2023")),
    ]);
    let decoded = registry.decode("Stamped", &tree, Options::new()).unwrap();
    assert_eq!(
        decoded.get("day"),
        Some(&Native::Date(NaiveDate::from_ymd_opt(2023, 5, 30).unwrap()))
    );
    let Some(Native::DateTimeTz(mail)) = decoded.get("mail") else {
        panic!("aware datetime expected");
    };
    assert_eq!(mail.timestamp(), 1_685_440_800);
}

#[test]
fn test_unknown_parser_name_is_a_schema_error() {
    let registry = Registry::new();
    registry
        .declare(
            RecordType::builder("R")
                .decl(FieldDecl::new("at", TypeDescriptor::datetime()).meta("deserialize", "pendulum"))
                .build(),
        )
        .unwrap();
    let err = registry.codec("R").unwrap_err();
    assert!(err.to_string().contains("unsupported deserialization engine \"pendulum\""));
}

#[test]
fn test_duration_timezone_and_scalars_as_text() {
    let durations = single(TypeDescriptor::Duration);
    let d = TimeDelta::milliseconds(1500);
    assert_eq!(encode(&durations, d, Options::new()), Value::Float(1.5));
    assert_eq!(decode(&durations, 90, Options::new()).unwrap(), Native::Duration(TimeDelta::seconds(90)));

    let zones = single(TypeDescriptor::Timezone);
    let tz = FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap();
    assert_eq!(encode(&zones, tz, Options::new()), Value::from("UTC-05:30"));
    assert_eq!(decode(&zones, "UTC", Options::new()).unwrap(), Native::Timezone(FixedOffset::east_opt(0).unwrap()));

    let decimals = single(TypeDescriptor::Decimal);
    let dec = Decimal::from_str("12.340").unwrap();
    assert_eq!(encode(&decimals, dec, Options::new()), Value::from("12.340"));

    let ratios = single(TypeDescriptor::Rational);
    assert_eq!(encode(&ratios, Ratio::<i64>::new(6, 4), Options::new()), Value::from("3/2"));
    assert_eq!(
        decode(&ratios, "3/2", Options::new()).unwrap(),
        Native::Rational(Ratio::new(3, 2))
    );
}

#[test]
fn test_dialect_native_kinds_compile_to_identity() {
    let registry = single(TypeDescriptor::date());
    let dialect = Dialect::new("native-dates")
        .serialize_native(NativeKind::Date)
        .deserialize_native(NativeKind::Date);
    let codec = registry.codec_for("R", &dialect).unwrap();
    let day = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();

    let tree = codec
        .to_generic(&Instance::new("R").with("v", day), Options::new())
        .unwrap();
    assert_eq!(tree.get("v"), Some(&Value::Native(Box::new(Native::Date(day)))));
    let back = codec.from_generic(&tree, Options::new()).unwrap();
    assert_eq!(back.get("v"), Some(&Native::Date(day)));

    assert!(!Arc::ptr_eq(&codec, &registry.codec("R").unwrap()));
}

#[test]
fn test_unsupported_shapes() {
    let err = schema_error(TypeDescriptor::Bare(ContainerKind::List));
    assert_eq!(
        err.to_string(),
        "Field \"v\" of type list in R is not serializable: Use List[T] instead"
    );

    let err = schema_error(TypeDescriptor::union([TypeDescriptor::int(), TypeDescriptor::str()]));
    assert!(matches!(err, SchemaError::UnserializableField { ref type_name, .. } if type_name == "Union[int, str]"));

    assert!(matches!(
        schema_error(TypeDescriptor::TypeVar(Arc::from("T"))),
        SchemaError::UnserializableField { .. }
    ));
    assert!(matches!(
        schema_error(TypeDescriptor::list(TypeDescriptor::AnyStr)),
        SchemaError::UnserializableField { ref field, .. } if field == "v"
    ));
    assert!(matches!(
        schema_error(TypeDescriptor::record("Missing")),
        SchemaError::UnresolvedType { ref name, .. } if name == "Missing"
    ));
}

#[test]
fn test_optional_union_is_normalised() {
    let registry = single(TypeDescriptor::union([TypeDescriptor::none(), TypeDescriptor::int()]));
    assert_eq!(decode(&registry, Value::Null, Options::new()).unwrap(), Native::Null);
    assert_eq!(decode(&registry, "5", Options::new()).unwrap(), Native::Int(5));
}

#[test]
fn test_record_keyed_mapping_is_rejected() {
    let registry = Registry::new();
    registry.declare(RecordType::builder("K").build()).unwrap();
    registry
        .declare(
            RecordType::builder("R")
                .field("v", TypeDescriptor::mapping(TypeDescriptor::record("K"), TypeDescriptor::int()))
                .build(),
        )
        .unwrap();
    assert!(matches!(
        registry.codec("R"),
        Err(SchemaError::UnserializableField { .. })
    ));
}

#[test]
fn test_strategy_fields_call_user_hooks() {
    let strategy = crate::types::RoundedDecimal::new(Some(2));
    let registry = single(TypeDescriptor::list(TypeDescriptor::strategy(strategy)));

    let prices = vec![
        Native::Decimal(Decimal::from_str("1.005").unwrap()),
        Native::Decimal(Decimal::from(4)),
    ];
    assert_eq!(
        encode(&registry, prices, Options::new()),
        Value::seq(["1.00", "4.00"])
    );
    assert_eq!(
        decode(&registry, Value::seq(["2.50"]), Options::new()).unwrap(),
        Native::Seq(vec![Native::Decimal(Decimal::from_str("2.50").unwrap())])
    );

    let err = decode(&registry, Value::seq([true]), Options::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::Decode(DecodeError::InvalidFieldValue { source: ConvertError::Hook(_), .. })
    ));
}

#[derive(Debug, PartialEq)]
struct Celsius(i64);

impl crate::types::SerializableType for Celsius {
    const TYPE_NAME: &'static str = "Celsius";

    fn serialize(&self) -> Result<Value, crate::types::HookError> {
        Ok(Value::Int(self.0))
    }

    fn deserialize(value: &Value) -> Result<Self, crate::types::HookError> {
        value.as_i64().map(Self).ok_or_else(|| "expected degrees".into())
    }
}

#[test]
fn test_protocol_fields_convert_themselves() {
    let registry = single(TypeDescriptor::optional(TypeDescriptor::protocol::<Celsius>()));
    assert_eq!(encode(&registry, Native::custom(Celsius(-4)), Options::new()), Value::Int(-4));
    assert_eq!(
        decode(&registry, 30, Options::new()).unwrap(),
        Native::custom(Celsius(30))
    );
    assert_eq!(decode(&registry, Value::Null, Options::new()).unwrap(), Native::Null);

    let err = single(TypeDescriptor::protocol::<Celsius>())
        .encode("R", &Instance::new("R").with("v", "warm"), Options::new())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Encode(EncodeError::InvalidValue { source: ConvertError::Hook(_), .. })
    ));
}

#[test]
fn test_sub_microsecond_durations_are_rejected() {
    let registry = single(TypeDescriptor::Duration);
    let exact = TimeDelta::microseconds(1_234_567);
    let tree = encode(&registry, exact, Options::new());
    assert_eq!(decode(&registry, tree, Options::new()).unwrap(), Native::Duration(exact));

    let err = registry
        .encode(
            "R",
            &Instance::new("R").with("v", TimeDelta::nanoseconds(1500)),
            Options::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Encode(EncodeError::InvalidValue { source: ConvertError::Inexact { .. }, .. })
    ));
}

#[test]
fn test_oversized_text_scalars_fail_as_field_errors() {
    let zones = single(TypeDescriptor::Timezone);
    for bad in ["UTC+999999:00", "UTC+24:00"] {
        assert!(matches!(
            decode(&zones, bad, Options::new()),
            Err(Error::Decode(DecodeError::InvalidFieldValue { source: ConvertError::Parse { .. }, .. }))
        ));
    }

    let ratios = single(TypeDescriptor::Rational);
    assert!(matches!(
        decode(&ratios, "-9223372036854775808/-1", Options::new()),
        Err(Error::Decode(DecodeError::InvalidFieldValue { source: ConvertError::Parse { .. }, .. }))
    ));
    assert_eq!(
        decode(&ratios, "-9223372036854775808/2", Options::new()).unwrap(),
        Native::Rational(Ratio::from_integer(i64::MIN / 2))
    );
}
