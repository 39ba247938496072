//! Read-model adapter from contract query responses to [`Poll`] / [`PollOption`].
//!
//! A response may arrive as the bare record or wrapped any number of times in
//! a `{type, value}` envelope, and each field of a record may be wrapped
//! independently of its parent. Normalization never fails: anything missing
//! or unrecognized maps to a fixed default.
//!
//! Numeric policy: every numeric field is a `u64`. Larger values saturate at
//! `u64::MAX` (logged), negative values clamp to `0`, numeric strings are
//! parsed, and anything else is `0`.

use std::collections::BTreeMap;

use crate::types::{Poll, PollOption, VoteRecord};

/// Unwrapping stops after this many nested envelopes.
pub const MAX_UNWRAP_DEPTH: usize = 64;

pub const DEFAULT_CREATOR: &str = "Unknown";
pub const DEFAULT_TITLE: &str = "Untitled";

static NULL: RawValue = RawValue::Null;

/// A loosely-typed response value, as handed out by the chain query layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i128),
    UInt(u128),
    Text(String),
    List(Vec<RawValue>),
    Record(BTreeMap<String, RawValue>),
    Envelope {
        type_name: String,
        value: Box<RawValue>,
    },
}

impl RawValue {
    pub fn envelope(type_name: impl Into<String>, value: RawValue) -> Self {
        RawValue::Envelope {
            type_name: type_name.into(),
            value: Box::new(value),
        }
    }

    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, RawValue)>,
    {
        RawValue::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(unwrap_envelope(self), RawValue::Null)
    }
}

impl From<&serde_json::Value> for RawValue {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(*b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    RawValue::UInt(u as u128)
                } else if let Some(i) = n.as_i64() {
                    RawValue::Int(i as i128)
                } else {
                    RawValue::Text(n.to_string())
                }
            }
            Value::String(s) => RawValue::Text(s.clone()),
            Value::Array(items) => RawValue::List(items.iter().map(RawValue::from).collect()),
            Value::Object(map) => match (map.get("type"), map.get("value")) {
                (Some(type_name), Some(inner)) => RawValue::Envelope {
                    type_name: type_name
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| type_name.to_string()),
                    value: Box::new(RawValue::from(inner)),
                },
                _ => RawValue::Record(
                    map.iter()
                        .map(|(k, v)| (k.clone(), RawValue::from(v)))
                        .collect(),
                ),
            },
        }
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        RawValue::from(&value)
    }
}

/// Strips envelopes until a non-envelope value is reached.
pub fn unwrap_envelope(raw: &RawValue) -> &RawValue {
    let mut current = raw;
    for _ in 0..MAX_UNWRAP_DEPTH {
        match current {
            RawValue::Envelope { value, .. } => current = value,
            _ => return current,
        }
    }
    match current {
        RawValue::Envelope { .. } => {
            tracing::warn!(
                "response nested deeper than {} envelopes, treating as null",
                MAX_UNWRAP_DEPTH
            );
            &NULL
        }
        other => other,
    }
}

fn field<'a>(fields: &'a BTreeMap<String, RawValue>, names: &[&str]) -> &'a RawValue {
    names
        .iter()
        .find_map(|name| fields.get(*name))
        .unwrap_or(&NULL)
}

fn saturate(value: u128, field: &str) -> u64 {
    u64::try_from(value).unwrap_or_else(|_| {
        tracing::warn!(field, %value, "numeric field exceeds u64, saturating");
        u64::MAX
    })
}

fn parse_numeric_text(text: &str, field: &str) -> u64 {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('u').unwrap_or(trimmed);
    if let Ok(n) = digits.parse::<u128>() {
        return saturate(n, field);
    }
    if digits.parse::<i128>().is_ok() {
        return 0;
    }
    match digits.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= u64::MAX as f64 => saturate(u128::MAX, field),
        Ok(f) if f.is_finite() && f > 0.0 => f.floor() as u64,
        _ => 0,
    }
}

/// Number coercion with the numeric policy described at module level.
pub fn coerce_u64(raw: &RawValue, field: &str) -> u64 {
    match unwrap_envelope(raw) {
        RawValue::UInt(n) => saturate(*n, field),
        RawValue::Int(n) if *n <= 0 => 0,
        RawValue::Int(n) => saturate(*n as u128, field),
        RawValue::Bool(b) => u64::from(*b),
        RawValue::Text(s) => parse_numeric_text(s, field),
        RawValue::Null | RawValue::List(_) | RawValue::Record(_) | RawValue::Envelope { .. } => 0,
    }
}

/// Truthiness: empty text, zero and null are false.
pub fn coerce_bool(raw: &RawValue) -> bool {
    match unwrap_envelope(raw) {
        RawValue::Bool(b) => *b,
        RawValue::Int(n) => *n != 0,
        RawValue::UInt(n) => *n != 0,
        RawValue::Text(s) => !s.is_empty(),
        RawValue::List(_) | RawValue::Record(_) => true,
        RawValue::Null | RawValue::Envelope { .. } => false,
    }
}

/// Text coercion; empty or non-scalar values fall back to `default`.
pub fn coerce_text(raw: &RawValue, default: &str) -> String {
    match unwrap_envelope(raw) {
        RawValue::Text(s) if !s.is_empty() => s.clone(),
        RawValue::Int(n) => n.to_string(),
        RawValue::UInt(n) => n.to_string(),
        RawValue::Bool(b) => b.to_string(),
        RawValue::Text(_)
        | RawValue::Null
        | RawValue::List(_)
        | RawValue::Record(_)
        | RawValue::Envelope { .. } => default.to_string(),
    }
}

fn empty_poll(poll_id: u64) -> Poll {
    Poll {
        poll_id,
        creator: DEFAULT_CREATOR.to_string(),
        title: DEFAULT_TITLE.to_string(),
        option_count: 0,
        deadline: 0,
        is_closed: false,
        total_votes: 0,
        created_at: 0,
    }
}

pub fn normalize_poll(poll_id: u64, raw: &RawValue) -> Poll {
    let fields = match unwrap_envelope(raw) {
        RawValue::Record(fields) => fields,
        RawValue::Null => return empty_poll(poll_id),
        other => {
            tracing::warn!(poll_id, ?other, "poll response is not a record");
            return empty_poll(poll_id);
        }
    };

    Poll {
        poll_id,
        creator: coerce_text(field(fields, &["creator"]), DEFAULT_CREATOR),
        title: coerce_text(field(fields, &["title"]), DEFAULT_TITLE),
        option_count: coerce_u64(
            field(fields, &["option-count", "optionCount"]),
            "option-count",
        ),
        deadline: coerce_u64(field(fields, &["deadline"]), "deadline"),
        is_closed: coerce_bool(field(fields, &["is-closed", "isClosed"])),
        total_votes: coerce_u64(field(fields, &["total-votes", "totalVotes"]), "total-votes"),
        created_at: coerce_u64(field(fields, &["created-at", "createdAt"]), "created-at"),
    }
}

pub fn normalize_option(option_index: u64, raw: &RawValue) -> PollOption {
    match unwrap_envelope(raw) {
        RawValue::Record(fields) => PollOption {
            option_index,
            text: coerce_text(field(fields, &["text"]), ""),
            vote_count: coerce_u64(field(fields, &["vote-count", "voteCount"]), "vote-count"),
        },
        RawValue::Null
        | RawValue::Bool(_)
        | RawValue::Int(_)
        | RawValue::UInt(_)
        | RawValue::Text(_)
        | RawValue::List(_)
        | RawValue::Envelope { .. } => PollOption {
            option_index,
            text: String::new(),
            vote_count: 0,
        },
    }
}

pub fn normalize_vote(raw: &RawValue) -> VoteRecord {
    match unwrap_envelope(raw) {
        RawValue::Record(fields) => VoteRecord {
            option_index: coerce_u64(
                field(fields, &["option-index", "optionIndex"]),
                "option-index",
            ),
            voted_at: coerce_u64(field(fields, &["voted-at", "votedAt"]), "voted-at"),
        },
        _ => VoteRecord {
            option_index: 0,
            voted_at: 0,
        },
    }
}
