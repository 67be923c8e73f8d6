//! Duration arithmetic for reports. Pure functions, no I/O.
//!
//! Durations are rendered as `HH:mm` (or `HH:mm:ss` when seconds are present),
//! with a leading `-` for negative spans.

use crate::domain::DomainError;
use chrono::TimeDelta;

/// Signed variance: `estimated - actual`. Positive means the work finished under time.
pub fn variance(estimated: TimeDelta, actual: TimeDelta) -> TimeDelta {
    estimated - actual
}

/// Durations are kept to whole seconds; storage and `HH:mm:ss` have no finer unit.
pub fn ensure_whole_seconds(what: &str, d: TimeDelta) -> Result<(), DomainError> {
    if d.subsec_nanos() != 0 {
        return Err(DomainError::InvalidState(format!(
            "{what} must be a whole number of seconds"
        )));
    }
    Ok(())
}

/// Variance over totals that may not have been recorded yet.
///
/// Both totals are a precondition; a missing one is an upstream data problem.
pub fn total_variance(
    estimated: Option<TimeDelta>,
    actual: Option<TimeDelta>,
) -> Result<TimeDelta, DomainError> {
    match (estimated, actual) {
        (Some(estimated), Some(actual)) => Ok(variance(estimated, actual)),
        (None, _) => Err(DomainError::Internal(
            "total estimated duration is not recorded".into(),
        )),
        (_, None) => Err(DomainError::Internal(
            "total actual duration is not recorded".into(),
        )),
    }
}

/// Format as `HH:mm`, or `HH:mm:ss` when the span has a seconds component.
pub fn format_hhmm(d: TimeDelta) -> String {
    let total = d.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let abs = total.unsigned_abs();
    let (h, m, s) = (abs / 3600, (abs % 3600) / 60, abs % 60);
    if s == 0 {
        format!("{sign}{h:02}:{m:02}")
    } else {
        format!("{sign}{h:02}:{m:02}:{s:02}")
    }
}

/// Parse `HH:mm` or `HH:mm:ss`, optionally prefixed with `-`.
pub fn parse_hhmm(s: &str) -> Option<TimeDelta> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let parts: Vec<&str> = body.split(':').collect();
    let (h, m, sec) = match parts.as_slice() {
        [h, m] => (h.parse::<i64>().ok()?, m.parse::<i64>().ok()?, 0),
        [h, m, sec] => (
            h.parse::<i64>().ok()?,
            m.parse::<i64>().ok()?,
            sec.parse::<i64>().ok()?,
        ),
        _ => return None,
    };
    if h < 0 || !(0..60).contains(&m) || !(0..60).contains(&sec) {
        return None;
    }
    let seconds = h.checked_mul(3600)?.checked_add(m * 60 + sec)?;
    let d = TimeDelta::try_seconds(seconds)?;
    Some(if negative { -d } else { d })
}

/// Serde adapter for `TimeDelta` fields (`#[serde(with = "hhmm")]`).
pub mod hhmm {
    use super::{format_hhmm, parse_hhmm};
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(d: &TimeDelta, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_hhmm(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<TimeDelta, D::Error> {
        let raw = String::deserialize(d)?;
        parse_hhmm(&raw).ok_or_else(|| D::Error::custom(format!("invalid duration `{raw}`")))
    }

    /// Same as the parent module, for `Option<TimeDelta>`.
    pub mod option {
        use super::{format_hhmm, parse_hhmm};
        use chrono::TimeDelta;
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        pub fn serialize<S: Serializer>(d: &Option<TimeDelta>, s: S) -> Result<S::Ok, S::Error> {
            match d {
                Some(d) => s.serialize_some(&format_hhmm(*d)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<TimeDelta>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => parse_hhmm(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid duration `{raw}`"))),
                None => Ok(None),
            }
        }
    }
}
