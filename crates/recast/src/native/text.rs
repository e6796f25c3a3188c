// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Canonical text forms of native scalar values.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use num_rational::Ratio;

pub(crate) fn format_date(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub(crate) fn format_time(t: &NaiveTime) -> String {
    let mut out = t.format("%H:%M:%S").to_string();
    let nanos = t.nanosecond() % 1_000_000_000;
    if nanos != 0 {
        if nanos % 1_000 == 0 {
            out.push_str(&format!(".{:06}", nanos / 1_000));
        } else {
            out.push_str(&format!(".{:09}", nanos));
        }
    }
    out
}

pub(crate) fn format_naive_datetime(dt: &NaiveDateTime) -> String {
    format!("{}T{}", format_date(&dt.date()), format_time(&dt.time()))
}

pub(crate) fn format_datetime(dt: &DateTime<FixedOffset>) -> String {
    format!(
        "{}{}",
        format_naive_datetime(&dt.naive_local()),
        dt.format("%:z")
    )
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string())
}

pub(crate) fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|e| e.to_string())
}

pub(crate) fn parse_naive_datetime(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|e| {
            parse_date(s)
                .map(|d| d.and_time(NaiveTime::MIN))
                .map_err(|_| e.to_string())
        })
}

/// Parse an ISO-8601 datetime, aware when the text carries an offset.
pub(crate) fn parse_datetime(s: &str) -> Result<ParsedDateTime, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(ParsedDateTime::Aware(dt));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%:z") {
        return Ok(ParsedDateTime::Aware(dt));
    }
    parse_naive_datetime(s).map(ParsedDateTime::Naive)
}

pub(crate) enum ParsedDateTime {
    Naive(NaiveDateTime),
    Aware(DateTime<FixedOffset>),
}

/// `UTC` for a zero offset, `UTC+HH:MM[:SS]` otherwise.
pub(crate) fn timezone_name(tz: &FixedOffset) -> String {
    let secs = tz.local_minus_utc();
    if secs == 0 {
        return "UTC".to_string();
    }
    let sign = if secs < 0 { '-' } else { '+' };
    let abs = secs.unsigned_abs();
    let (h, m, s) = (abs / 3600, (abs % 3600) / 60, abs % 60);
    if s == 0 {
        format!("UTC{}{:02}:{:02}", sign, h, m)
    } else {
        format!("UTC{}{:02}:{:02}:{:02}", sign, h, m, s)
    }
}

pub(crate) fn parse_timezone(s: &str) -> Result<FixedOffset, String> {
    let rest = s
        .strip_prefix("UTC")
        .ok_or_else(|| "timezone name must start with UTC".to_string())?;
    if rest.is_empty() {
        return FixedOffset::east_opt(0).ok_or_else(|| "invalid offset".to_string());
    }
    let (sign, digits) = match rest.as_bytes().first() {
        Some(b'+') => (1, &rest[1..]),
        Some(b'-') => (-1, &rest[1..]),
        _ => return Err(format!("invalid offset {:?}", rest)),
    };
    let mut secs = 0i32;
    let mut parts = 0;
    for (i, part) in digits.split(':').enumerate() {
        let (unit, max) = [(3600, 23), (60, 59), (1, 59)]
            .get(i)
            .copied()
            .ok_or("too many offset components")?;
        let n: i32 = match part.parse() {
            Ok(n) if (0..=max).contains(&n) && is_two_digits(part) => n,
            _ => return Err(format!("invalid offset component {:?}", part)),
        };
        secs = n
            .checked_mul(unit)
            .and_then(|v| secs.checked_add(v))
            .ok_or_else(|| format!("offset {:?} out of range", rest))?;
        parts += 1;
    }
    if parts < 2 {
        return Err("offset must be HH:MM".to_string());
    }
    FixedOffset::east_opt(sign * secs).ok_or_else(|| format!("offset {:?} out of range", rest))
}

fn is_two_digits(part: &str) -> bool {
    part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit())
}

/// Seconds as a float.
///
/// `None` unless the duration is a whole number of microseconds small
/// enough for a float to carry exactly.
pub(crate) fn total_seconds(d: &TimeDelta) -> Option<f64> {
    if d.subsec_nanos() % 1_000 != 0 {
        return None;
    }
    d.num_microseconds()
        .filter(|us| us.unsigned_abs() <= 1 << 53)
        .map(|us| us as f64 / 1e6)
}

/// Microsecond-resolution duration from a seconds count.
pub(crate) fn duration_from_seconds(secs: f64) -> Option<TimeDelta> {
    let micros = (secs * 1e6).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(TimeDelta::microseconds(micros as i64))
}

pub(crate) fn format_ratio(r: &Ratio<i64>) -> String {
    if *r.denom() == 1 {
        r.numer().to_string()
    } else {
        format!("{}/{}", r.numer(), r.denom())
    }
}

pub(crate) fn parse_ratio(s: &str) -> Result<Ratio<i64>, String> {
    let s = s.trim();
    let (numer, denom) = match s.split_once('/') {
        Some((n, d)) => (n.trim(), d.trim()),
        None => (s, "1"),
    };
    let numer: i64 = numer.parse().map_err(|e| format!("numerator: {}", e))?;
    let denom: i64 = denom.parse().map_err(|e| format!("denominator: {}", e))?;
    if denom == 0 {
        return Err("zero denominator".to_string());
    }

    // Reduce in i128: i64::MIN cannot be negated in place.
    let (mut n, mut d) = (i128::from(numer), i128::from(denom));
    let g = gcd(n.unsigned_abs(), d.unsigned_abs()) as i128;
    n /= g;
    d /= g;
    if d < 0 {
        n = -n;
        d = -d;
    }
    match (i64::try_from(n), i64::try_from(d)) {
        (Ok(n), Ok(d)) => Ok(Ratio::new_raw(n, d)),
        _ => Err(format!("{}/{} does not fit a 64-bit ratio", numer, denom)),
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
