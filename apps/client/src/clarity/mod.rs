//! Clarity values as they travel between this client and a Stacks node.
//!
//! Read-only calls send their arguments as hex-encoded consensus
//! serializations and get one back. [`ClarityValue::to_raw`] converts the
//! decoded value into the loosely-typed [`RawValue`] shape that the query
//! SDK exposes to application code, envelopes included.

pub mod c32;
mod codec;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ClarityError;
use crate::normalize::RawValue;

pub use codec::MAX_VALUE_DEPTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StandardPrincipal {
    pub version: u8,
    pub hash160: [u8; c32::HASH160_LEN],
}

impl StandardPrincipal {
    pub fn to_address(&self) -> Result<String, ClarityError> {
        c32::c32_address(self.version, &self.hash160)
    }
}

impl FromStr for StandardPrincipal {
    type Err = ClarityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (version, hash160) = c32::parse_c32_address(s.trim())?;
        Ok(Self { version, hash160 })
    }
}

impl fmt::Display for StandardPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_address() {
            Ok(address) => f.write_str(&address),
            Err(_) => write!(f, "<invalid principal v{}>", self.version),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClarityValue {
    Int(i128),
    UInt(u128),
    Buffer(Vec<u8>),
    Bool(bool),
    StandardPrincipal(StandardPrincipal),
    ContractPrincipal {
        issuer: StandardPrincipal,
        name: String,
    },
    ResponseOk(Box<ClarityValue>),
    ResponseErr(Box<ClarityValue>),
    OptionalNone,
    OptionalSome(Box<ClarityValue>),
    List(Vec<ClarityValue>),
    /// Field order on the wire is the sorted key order, which `BTreeMap` keeps.
    Tuple(BTreeMap<String, ClarityValue>),
    StringAscii(String),
    StringUtf8(String),
}

impl ClarityValue {
    pub fn uint(value: impl Into<u128>) -> Self {
        ClarityValue::UInt(value.into())
    }

    /// `string-ascii`, rejected when any character falls outside ASCII.
    pub fn string_ascii(value: impl Into<String>) -> Result<Self, ClarityError> {
        let value = value.into();
        if !value.is_ascii() {
            return Err(ClarityError::NotAscii);
        }
        Ok(ClarityValue::StringAscii(value))
    }

    /// Accepts `ADDR` for a standard principal or `ADDR.name` for a contract.
    pub fn principal(value: &str) -> Result<Self, ClarityError> {
        match value.trim().split_once('.') {
            Some((address, name)) => {
                if name.is_empty() || !name.is_ascii() {
                    return Err(ClarityError::InvalidPrincipal(value.to_string()));
                }
                Ok(ClarityValue::ContractPrincipal {
                    issuer: address.parse()?,
                    name: name.to_string(),
                })
            }
            None => Ok(ClarityValue::StandardPrincipal(value.parse()?)),
        }
    }

    pub fn some(value: ClarityValue) -> Self {
        ClarityValue::OptionalSome(Box::new(value))
    }

    pub fn ok(value: ClarityValue) -> Self {
        ClarityValue::ResponseOk(Box::new(value))
    }

    pub fn tuple<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ClarityValue)>,
    {
        ClarityValue::Tuple(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Clarity type signature, e.g. `(optional (tuple (title (string-ascii 5))))`.
    pub fn type_name(&self) -> String {
        match self {
            ClarityValue::Int(_) => "int".to_string(),
            ClarityValue::UInt(_) => "uint".to_string(),
            ClarityValue::Buffer(bytes) => format!("(buff {})", bytes.len()),
            ClarityValue::Bool(_) => "bool".to_string(),
            ClarityValue::StandardPrincipal(_) | ClarityValue::ContractPrincipal { .. } => {
                "principal".to_string()
            }
            ClarityValue::ResponseOk(v) => format!("(response {} UnknownType)", v.type_name()),
            ClarityValue::ResponseErr(v) => format!("(response UnknownType {})", v.type_name()),
            ClarityValue::OptionalNone => "(optional NoType)".to_string(),
            ClarityValue::OptionalSome(v) => format!("(optional {})", v.type_name()),
            ClarityValue::List(items) => {
                let inner = items
                    .first()
                    .map(|v| v.type_name())
                    .unwrap_or_else(|| "UnknownType".to_string());
                format!("(list {} {})", items.len(), inner)
            }
            ClarityValue::Tuple(fields) => {
                let inner: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("({} {})", k, v.type_name()))
                    .collect();
                format!("(tuple {})", inner.join(" "))
            }
            ClarityValue::StringAscii(s) => format!("(string-ascii {})", s.len()),
            ClarityValue::StringUtf8(s) => format!("(string-utf8 {})", s.len()),
        }
    }

    /// Plain value shape: `(some x)` / `(ok x)` and every tuple field or list
    /// item come back wrapped in a `{type, value}` envelope.
    pub fn to_raw(&self) -> RawValue {
        match self {
            ClarityValue::Int(n) => RawValue::Int(*n),
            ClarityValue::UInt(n) => RawValue::UInt(*n),
            ClarityValue::Bool(b) => RawValue::Bool(*b),
            ClarityValue::Buffer(bytes) => RawValue::Text(format!("0x{}", hex::encode(bytes))),
            ClarityValue::StandardPrincipal(_)
            | ClarityValue::ContractPrincipal { .. }
            | ClarityValue::StringAscii(_)
            | ClarityValue::StringUtf8(_) => RawValue::Text(self.principal_or_text()),
            ClarityValue::OptionalNone => RawValue::Null,
            ClarityValue::OptionalSome(v)
            | ClarityValue::ResponseOk(v)
            | ClarityValue::ResponseErr(v) => v.to_envelope(),
            ClarityValue::List(items) => {
                RawValue::List(items.iter().map(|v| v.to_envelope()).collect())
            }
            ClarityValue::Tuple(fields) => RawValue::Record(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_envelope()))
                    .collect(),
            ),
        }
    }

    /// JSON shape `{type, value}`; integers are carried as decimal text.
    pub fn to_envelope(&self) -> RawValue {
        let value = match self {
            ClarityValue::Int(n) => RawValue::Text(n.to_string()),
            ClarityValue::UInt(n) => RawValue::Text(n.to_string()),
            ClarityValue::OptionalNone => RawValue::Null,
            other => other.to_raw(),
        };
        RawValue::Envelope {
            type_name: self.type_name(),
            value: Box::new(value),
        }
    }

    fn principal_or_text(&self) -> String {
        match self {
            ClarityValue::StandardPrincipal(p) => p.to_string(),
            ClarityValue::ContractPrincipal { issuer, name } => format!("{}.{}", issuer, name),
            ClarityValue::StringAscii(s) | ClarityValue::StringUtf8(s) => s.clone(),
            _ => String::new(),
        }
    }
}
