// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compiled conversion plans.
//!
//! A plan is the specialised form of one type descriptor: all type analysis
//! happened when it was built, so running it is a single `match` per node.

use super::discriminator::{Discriminator, PolyEncoder};
use crate::config::Options;
use crate::error::ConvertError;
use crate::native::text::{self, ParsedDateTime};
use crate::native::{Native, NativeMap, NativeSet, PathFlavor, PathValue};
use crate::registry::Link;
use crate::types::{DateParser, EnumType, ProtocolType, SerializationStrategy, TemporalKind};
use crate::value::{Map, Value};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset, TimeDelta};
use num_rational::Ratio;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Typed value to tree.
#[derive(Debug)]
pub(crate) enum EncodePlan {
    /// Structural copy; used for `Any` and dialect-native kinds.
    Identity,
    Str,
    Bool,
    NoneType,
    Int,
    Float,
    Bytes,
    Optional(Box<EncodePlan>),
    Sequence(Box<EncodePlan>),
    Mapping {
        key: Box<EncodePlan>,
        value: Box<EncodePlan>,
    },
    ChainMap {
        key: Box<EncodePlan>,
        value: Box<EncodePlan>,
    },
    Literal(Vec<Value>),
    Enum(Arc<EnumType>),
    Path,
    Temporal(TemporalKind),
    Duration,
    Timezone,
    Uuid,
    Decimal,
    Rational,
    Record(Link),
    Polymorphic(PolyEncoder),
    Strategy(Arc<dyn SerializationStrategy>),
    Protocol(Arc<dyn ProtocolType>),
}

/// Tree to typed value.
#[derive(Debug)]
pub(crate) enum DecodePlan {
    Identity,
    Str,
    Bool,
    NoneType,
    Int,
    Float,
    Bytes,
    Optional(Box<DecodePlan>),
    Sequence(Box<DecodePlan>),
    Set(Box<DecodePlan>),
    Mapping {
        key: KeyPlan,
        value: Box<DecodePlan>,
    },
    ChainMap {
        key: KeyPlan,
        value: Box<DecodePlan>,
    },
    Literal(Vec<Value>),
    Enum(Arc<EnumType>),
    Path(PathFlavor),
    Temporal {
        kind: TemporalKind,
        parser: Option<TemporalParser>,
    },
    Duration,
    Timezone,
    Uuid,
    Decimal,
    Rational,
    Record(Link),
    Polymorphic(Discriminator),
    Strategy(Arc<dyn SerializationStrategy>),
    Protocol(Arc<dyn ProtocolType>),
}

/// How map keys come back from their text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyHint {
    Text,
    Int,
    Float,
    Bool,
}

#[derive(Debug)]
pub(crate) struct KeyPlan {
    pub(crate) hint: KeyHint,
    pub(crate) plan: Box<DecodePlan>,
}

/// Per-field date/time parser selected through metadata.
#[derive(Clone)]
pub(crate) enum TemporalParser {
    Rfc3339,
    Rfc2822,
    Custom(DateParser),
}

impl fmt::Debug for TemporalParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rfc3339 => f.write_str("Rfc3339"),
            Self::Rfc2822 => f.write_str("Rfc2822"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

impl EncodePlan {
    pub(crate) fn encode(&self, value: &Native, opts: &Options) -> Result<Value, ConvertError> {
        match self {
            Self::Identity => Ok(value.to_value()),
            Self::Str => match value {
                Native::Str(s) => Ok(Value::Str(s.clone())),
                other => Err(expected("string", other)),
            },
            Self::Bool => match value {
                Native::Bool(b) => Ok(Value::Bool(*b)),
                other => Err(expected("bool", other)),
            },
            Self::NoneType => match value {
                Native::Null => Ok(Value::Null),
                other => Err(expected("null", other)),
            },
            Self::Int => match value {
                Native::Int(i) => Ok(Value::Int(*i)),
                Native::Bool(b) => Ok(Value::Int(i64::from(*b))),
                Native::Float(f) => float_to_int(*f).map(Value::Int),
                other => Err(expected("int", other)),
            },
            Self::Float => match value {
                Native::Float(f) => Ok(Value::Float(*f)),
                Native::Int(i) => Ok(Value::Float(*i as f64)),
                Native::Bool(b) => Ok(Value::Float(f64::from(u8::from(*b)))),
                other => Err(expected("float", other)),
            },
            Self::Bytes => match value {
                Native::Bytes(b) if opts.use_bytes => Ok(Value::Bytes(b.clone())),
                Native::Bytes(b) => Ok(Value::Str(BASE64.encode(b))),
                other => Err(expected("bytes", other)),
            },
            Self::Optional(inner) => match value {
                Native::Null => Ok(Value::Null),
                other => inner.encode(other, opts),
            },
            Self::Sequence(inner) => match value {
                Native::Seq(items) => encode_items(inner, items.iter(), opts),
                Native::Set(items) => encode_items(inner, items.iter(), opts),
                other => Err(expected("sequence", other)),
            },
            Self::Mapping { key, value: item } => match value {
                Native::Map(pairs) => encode_pairs(key, item, pairs, opts).map(Value::Map),
                other => Err(expected("mapping", other)),
            },
            Self::ChainMap { key, value: item } => match value {
                Native::ChainMap(layers) => layers
                    .iter()
                    .map(|pairs| encode_pairs(key, item, pairs, opts).map(Value::Map))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Seq),
                other => Err(expected("chain map", other)),
            },
            Self::Literal(allowed) => {
                let v = value.to_value();
                if allowed.contains(&v) {
                    Ok(v)
                } else {
                    Err(not_allowed(v, allowed))
                }
            }
            Self::Enum(enum_type) => match value {
                Native::Enum(member) if member.enum_name == enum_type.name => {
                    if opts.use_enum {
                        Ok(Value::Native(Box::new(value.clone())))
                    } else {
                        Ok(member.value.clone())
                    }
                }
                Native::Enum(member) => Err(ConvertError::WrongEnum {
                    expected: enum_type.name.to_string(),
                    found: member.enum_name.to_string(),
                }),
                other => Err(expected("enum member", other)),
            },
            Self::Path => match value {
                Native::Path(p) => p
                    .path
                    .to_str()
                    .map(|s| Value::Str(s.to_string()))
                    .ok_or(ConvertError::NonUtf8Path),
                Native::Str(s) => Ok(Value::Str(s.clone())),
                other => Err(expected("path", other)),
            },
            Self::Temporal(kind) => encode_temporal(*kind, value, opts),
            Self::Duration => match value {
                Native::Duration(d) => text::total_seconds(d)
                    .map(Value::Float)
                    .ok_or_else(|| ConvertError::Inexact {
                        target: "seconds",
                        value: d.to_string(),
                    }),
                other => Err(expected("duration", other)),
            },
            Self::Timezone => match value {
                Native::Timezone(tz) => Ok(Value::Str(text::timezone_name(tz))),
                other => Err(expected("timezone", other)),
            },
            Self::Uuid => match value {
                Native::Uuid(u) => Ok(Value::Str(u.hyphenated().to_string())),
                other => Err(expected("uuid", other)),
            },
            Self::Decimal => match value {
                Native::Decimal(d) => Ok(Value::Str(d.to_string())),
                other => Err(expected("decimal", other)),
            },
            Self::Rational => match value {
                Native::Rational(r) => Ok(Value::Str(text::format_ratio(r))),
                other => Err(expected("rational", other)),
            },
            Self::Record(link) => match value {
                Native::Record(instance) => Ok(link.get()?.to_generic(instance, *opts)?),
                other => Err(expected("record", other)),
            },
            Self::Polymorphic(poly) => poly.encode(value, opts),
            Self::Strategy(strategy) => Ok(strategy.serialize(value)?),
            Self::Protocol(protocol) => Ok(protocol.serialize(value)?),
        }
    }
}

fn encode_items<'a>(
    plan: &EncodePlan,
    items: impl Iterator<Item = &'a Native>,
    opts: &Options,
) -> Result<Value, ConvertError> {
    items
        .map(|item| plan.encode(item, opts))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Seq)
}

fn encode_pairs(
    key: &EncodePlan,
    value: &EncodePlan,
    pairs: &NativeMap,
    opts: &Options,
) -> Result<Map, ConvertError> {
    let key_opts = opts.for_keys();
    let mut out = Map::with_capacity(pairs.len());
    for (k, v) in pairs {
        out.insert(key_text(key.encode(k, &key_opts)?)?, value.encode(v, opts)?);
    }
    Ok(out)
}

fn key_text(key: Value) -> Result<String, ConvertError> {
    match key {
        Value::Str(s) => Ok(s),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        other => Err(ConvertError::Expected {
            expected: "scalar key",
            found: other.kind_name(),
        }),
    }
}

fn encode_temporal(kind: TemporalKind, value: &Native, opts: &Options) -> Result<Value, ConvertError> {
    let text = match (kind, value) {
        (TemporalKind::Date, Native::Date(d)) if !opts.use_datetime => text::format_date(d),
        (TemporalKind::Time, Native::Time(t)) if !opts.use_datetime => text::format_time(t),
        (TemporalKind::DateTime, Native::DateTime(dt)) if !opts.use_datetime => {
            text::format_naive_datetime(dt)
        }
        (TemporalKind::DateTime, Native::DateTimeTz(dt)) if !opts.use_datetime => {
            text::format_datetime(dt)
        }
        (kind, other) if temporal_matches(kind, other) => {
            return Ok(Value::Native(Box::new(other.clone())));
        }
        (kind, other) => return Err(expected(temporal_name(kind), other)),
    };
    Ok(Value::Str(text))
}

// ============================================================================
// Decoding
// ============================================================================

impl DecodePlan {
    pub(crate) fn decode(&self, value: &Value, opts: &Options) -> Result<Native, ConvertError> {
        match self {
            Self::Identity => Ok(Native::from_value(value)),
            Self::Str => match value {
                Value::Str(s) => Ok(Native::Str(s.clone())),
                other => Err(expected_value("string", other)),
            },
            Self::Bool => match value {
                Value::Bool(b) => Ok(Native::Bool(*b)),
                other => Err(expected_value("bool", other)),
            },
            Self::NoneType => match value {
                Value::Null => Ok(Native::Null),
                other => Err(expected_value("null", other)),
            },
            Self::Int => match value {
                Value::Int(i) => Ok(Native::Int(*i)),
                Value::Float(f) => float_to_int(*f).map(Native::Int),
                Value::Bool(b) => Ok(Native::Int(i64::from(*b))),
                Value::Str(s) => s.trim().parse().map(Native::Int).map_err(|e| ConvertError::Parse {
                    target: "int",
                    text: s.clone(),
                    reason: e.to_string(),
                }),
                other => Err(expected_value("int", other)),
            },
            Self::Float => match value {
                Value::Float(f) => Ok(Native::Float(*f)),
                Value::Int(i) => Ok(Native::Float(*i as f64)),
                Value::Bool(b) => Ok(Native::Float(f64::from(u8::from(*b)))),
                Value::Str(s) => s.trim().parse().map(Native::Float).map_err(|e| ConvertError::Parse {
                    target: "float",
                    text: s.clone(),
                    reason: e.to_string(),
                }),
                other => Err(expected_value("float", other)),
            },
            Self::Bytes => match value {
                Value::Bytes(b) => Ok(Native::Bytes(b.clone())),
                Value::Str(s) => {
                    let compact: String = s.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                    BASE64
                        .decode(compact.as_bytes())
                        .map(Native::Bytes)
                        .map_err(|e| ConvertError::Parse {
                            target: "base64 bytes",
                            text: s.clone(),
                            reason: e.to_string(),
                        })
                }
                other => Err(expected_value("bytes", other)),
            },
            Self::Optional(inner) => match value {
                Value::Null => Ok(Native::Null),
                other => inner.decode(other, opts),
            },
            Self::Sequence(inner) => match value {
                Value::Seq(items) => items
                    .iter()
                    .map(|item| inner.decode(item, opts))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Native::Seq),
                other => Err(expected_value("sequence", other)),
            },
            Self::Set(inner) => match value {
                Value::Seq(items) => items
                    .iter()
                    .map(|item| inner.decode(item, opts))
                    .collect::<Result<NativeSet, _>>()
                    .map(Native::Set),
                other => Err(expected_value("sequence", other)),
            },
            Self::Mapping { key, value: item } => match value {
                Value::Map(map) => decode_pairs(key, item, map, opts).map(Native::Map),
                other => Err(expected_value("map", other)),
            },
            Self::ChainMap { key, value: item } => match value {
                Value::Seq(layers) => layers
                    .iter()
                    .map(|layer| match layer {
                        Value::Map(map) => decode_pairs(key, item, map, opts),
                        other => Err(expected_value("map", other)),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Native::ChainMap),
                other => Err(expected_value("sequence of maps", other)),
            },
            Self::Literal(allowed) => {
                if allowed.contains(value) {
                    Ok(Native::from_value(value))
                } else {
                    Err(not_allowed(value.clone(), allowed))
                }
            }
            Self::Enum(enum_type) => decode_enum(enum_type, value),
            Self::Path(flavor) => match value {
                Value::Str(s) => Ok(Native::Path(PathValue::new(*flavor, s.as_str()))),
                other => Err(expected_value("path string", other)),
            },
            Self::Temporal { kind, parser } => match value {
                Value::Native(n) if temporal_matches(*kind, n) => Ok((**n).clone()),
                Value::Str(s) => decode_temporal(*kind, parser.as_ref(), s),
                other => Err(expected_value(temporal_name(*kind), other)),
            },
            Self::Duration => match value {
                Value::Int(secs) => secs
                    .checked_mul(1_000_000)
                    .map(|us| Native::Duration(TimeDelta::microseconds(us)))
                    .ok_or_else(|| out_of_range("duration", value)),
                Value::Float(secs) => text::duration_from_seconds(*secs)
                    .map(Native::Duration)
                    .ok_or_else(|| out_of_range("duration", value)),
                Value::Native(n) if matches!(**n, Native::Duration(_)) => Ok((**n).clone()),
                other => Err(expected_value("seconds", other)),
            },
            Self::Timezone => match value {
                Value::Str(s) => text::parse_timezone(s)
                    .map(Native::Timezone)
                    .map_err(|reason| parse_error("timezone", s, reason)),
                other => Err(expected_value("timezone name", other)),
            },
            Self::Uuid => match value {
                Value::Str(s) => Uuid::parse_str(s)
                    .map(Native::Uuid)
                    .map_err(|e| parse_error("uuid", s, e.to_string())),
                Value::Native(n) if matches!(**n, Native::Uuid(_)) => Ok((**n).clone()),
                other => Err(expected_value("uuid string", other)),
            },
            Self::Decimal => match value {
                Value::Str(s) => Decimal::from_str(s.trim())
                    .map(Native::Decimal)
                    .map_err(|e| parse_error("decimal", s, e.to_string())),
                Value::Int(i) => Ok(Native::Decimal(Decimal::from(*i))),
                Value::Float(f) => {
                    let s = f.to_string();
                    Decimal::from_str(&s)
                        .map(Native::Decimal)
                        .map_err(|e| parse_error("decimal", &s, e.to_string()))
                }
                Value::Native(n) if matches!(**n, Native::Decimal(_)) => Ok((**n).clone()),
                other => Err(expected_value("decimal string", other)),
            },
            Self::Rational => match value {
                Value::Str(s) => text::parse_ratio(s)
                    .map(Native::Rational)
                    .map_err(|reason| parse_error("rational", s, reason)),
                Value::Int(i) => Ok(Native::Rational(Ratio::from_integer(*i))),
                other => Err(expected_value("rational string", other)),
            },
            Self::Record(link) => Ok(Native::Record(link.get()?.from_generic(value, *opts)?)),
            Self::Polymorphic(discriminator) => discriminator.decode(value, opts),
            Self::Strategy(strategy) => Ok(strategy.deserialize(value)?),
            Self::Protocol(protocol) => Ok(protocol.deserialize(value)?),
        }
    }
}

impl KeyPlan {
    fn decode(&self, text: &str, opts: &Options) -> Result<Native, ConvertError> {
        let raw = match self.hint {
            KeyHint::Text => Value::Str(text.to_string()),
            KeyHint::Int => Value::Int(
                text.parse()
                    .map_err(|e: std::num::ParseIntError| parse_error("int key", text, e.to_string()))?,
            ),
            KeyHint::Float => Value::Float(
                text.parse()
                    .map_err(|e: std::num::ParseFloatError| parse_error("float key", text, e.to_string()))?,
            ),
            KeyHint::Bool => match text {
                "true" | "True" => Value::Bool(true),
                "false" | "False" => Value::Bool(false),
                _ => return Err(parse_error("bool key", text, "expected true or false".to_string())),
            },
        };
        self.plan.decode(&raw, &opts.for_keys())
    }
}

fn decode_pairs(
    key: &KeyPlan,
    value: &DecodePlan,
    map: &Map,
    opts: &Options,
) -> Result<NativeMap, ConvertError> {
    map.iter()
        .map(|(k, v)| Ok((key.decode(k, opts)?, value.decode(v, opts)?)))
        .collect()
}

fn decode_enum(enum_type: &EnumType, value: &Value) -> Result<Native, ConvertError> {
    if let Value::Native(n) = value {
        if let Native::Enum(member) = &**n {
            return if member.enum_name == enum_type.name {
                Ok(Native::Enum(member.clone()))
            } else {
                Err(ConvertError::WrongEnum {
                    expected: enum_type.name.to_string(),
                    found: member.enum_name.to_string(),
                })
            };
        }
    }
    enum_type
        .by_value(value)
        .map(Native::Enum)
        .ok_or_else(|| ConvertError::UnknownEnumValue {
            enum_name: enum_type.name.to_string(),
            value: value.clone(),
        })
}

fn decode_temporal(
    kind: TemporalKind,
    parser: Option<&TemporalParser>,
    s: &str,
) -> Result<Native, ConvertError> {
    let named: fn(&str) -> chrono::ParseResult<DateTime<FixedOffset>> = match parser {
        Some(TemporalParser::Custom(parse)) => return Ok(parse(s)?),
        Some(TemporalParser::Rfc3339) => DateTime::parse_from_rfc3339,
        Some(TemporalParser::Rfc2822) => DateTime::parse_from_rfc2822,
        None => return decode_iso(kind, s),
    };
    let dt = named(s).map_err(|e| parse_error(temporal_name(kind), s, e.to_string()))?;
    Ok(match kind {
        TemporalKind::Date => Native::Date(dt.date_naive()),
        TemporalKind::Time => Native::Time(dt.time()),
        TemporalKind::DateTime => Native::DateTimeTz(dt),
    })
}

fn decode_iso(kind: TemporalKind, s: &str) -> Result<Native, ConvertError> {
    let parsed = match kind {
        TemporalKind::Date => text::parse_date(s).map(Native::Date),
        TemporalKind::Time => text::parse_time(s).map(Native::Time),
        TemporalKind::DateTime => text::parse_datetime(s).map(|dt| match dt {
            ParsedDateTime::Naive(dt) => Native::DateTime(dt),
            ParsedDateTime::Aware(dt) => Native::DateTimeTz(dt),
        }),
    };
    parsed.map_err(|reason| parse_error(temporal_name(kind), s, reason))
}

// ============================================================================
// Helpers
// ============================================================================

pub(crate) fn temporal_matches(kind: TemporalKind, value: &Native) -> bool {
    matches!(
        (kind, value),
        (TemporalKind::Date, Native::Date(_))
            | (TemporalKind::Time, Native::Time(_))
            | (TemporalKind::DateTime, Native::DateTime(_) | Native::DateTimeTz(_))
    )
}

fn temporal_name(kind: TemporalKind) -> &'static str {
    match kind {
        TemporalKind::Date => "date",
        TemporalKind::Time => "time",
        TemporalKind::DateTime => "datetime",
    }
}

fn float_to_int(f: f64) -> Result<i64, ConvertError> {
    let t = f.trunc();
    if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
        Ok(t as i64)
    } else {
        Err(ConvertError::OutOfRange {
            target: "int",
            value: Value::Float(f),
        })
    }
}

fn expected(expected: &'static str, found: &Native) -> ConvertError {
    ConvertError::Expected {
        expected,
        found: found.kind_name(),
    }
}

fn expected_value(expected: &'static str, found: &Value) -> ConvertError {
    ConvertError::Expected {
        expected,
        found: found.kind_name(),
    }
}

fn parse_error(target: &'static str, text: &str, reason: String) -> ConvertError {
    ConvertError::Parse {
        target,
        text: text.to_string(),
        reason,
    }
}

fn out_of_range(target: &'static str, value: &Value) -> ConvertError {
    ConvertError::OutOfRange {
        target,
        value: value.clone(),
    }
}

fn not_allowed(value: Value, allowed: &[Value]) -> ConvertError {
    let rendered: Vec<String> = allowed.iter().map(Value::to_string).collect();
    ConvertError::NotAllowed {
        value,
        allowed: format!("[{}]", rendered.join(", ")),
    }
}

