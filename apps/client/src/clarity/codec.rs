use std::collections::BTreeMap;

use super::{c32, ClarityValue, StandardPrincipal};
use crate::error::ClarityError;

const TYPE_INT: u8 = 0x00;
const TYPE_UINT: u8 = 0x01;
const TYPE_BUFFER: u8 = 0x02;
const TYPE_TRUE: u8 = 0x03;
const TYPE_FALSE: u8 = 0x04;
const TYPE_STANDARD_PRINCIPAL: u8 = 0x05;
const TYPE_CONTRACT_PRINCIPAL: u8 = 0x06;
const TYPE_RESPONSE_OK: u8 = 0x07;
const TYPE_RESPONSE_ERR: u8 = 0x08;
const TYPE_OPTIONAL_NONE: u8 = 0x09;
const TYPE_OPTIONAL_SOME: u8 = 0x0a;
const TYPE_LIST: u8 = 0x0b;
const TYPE_TUPLE: u8 = 0x0c;
const TYPE_STRING_ASCII: u8 = 0x0d;
const TYPE_STRING_UTF8: u8 = 0x0e;

/// Deepest nesting accepted when decoding node responses.
pub const MAX_VALUE_DEPTH: usize = 64;

const MAX_NAME_LEN: usize = u8::MAX as usize;

impl ClarityValue {
    pub fn serialize(&self) -> Result<Vec<u8>, ClarityError> {
        let mut out = Vec::new();
        write_value(self, &mut out)?;
        Ok(out)
    }

    /// Decodes exactly one value; leftover bytes are an error.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, ClarityError> {
        let mut reader = Reader { bytes, pos: 0 };
        let value = reader.value(0)?;
        let remaining = bytes.len() - reader.pos;
        if remaining > 0 {
            return Err(ClarityError::TrailingBytes(remaining));
        }
        Ok(value)
    }

    pub fn to_hex(&self) -> Result<String, ClarityError> {
        Ok(format!("0x{}", hex::encode(self.serialize()?)))
    }

    pub fn from_hex(input: &str) -> Result<Self, ClarityError> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|e| ClarityError::InvalidHex(e.to_string()))?;
        Self::deserialize(&bytes)
    }
}

fn write_len(len: usize, out: &mut Vec<u8>) -> Result<(), ClarityError> {
    let len = u32::try_from(len).map_err(|_| ClarityError::TooLong(len))?;
    out.extend_from_slice(&len.to_be_bytes());
    Ok(())
}

fn write_name(name: &str, out: &mut Vec<u8>) -> Result<(), ClarityError> {
    if !name.is_ascii() {
        return Err(ClarityError::NotAscii);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ClarityError::TooLong(name.len()));
    }
    out.push(name.len() as u8);
    out.extend_from_slice(name.as_bytes());
    Ok(())
}

fn write_principal(principal: &StandardPrincipal, out: &mut Vec<u8>) {
    out.push(principal.version);
    out.extend_from_slice(&principal.hash160);
}

fn write_value(value: &ClarityValue, out: &mut Vec<u8>) -> Result<(), ClarityError> {
    match value {
        ClarityValue::Int(n) => {
            out.push(TYPE_INT);
            out.extend_from_slice(&n.to_be_bytes());
        }
        ClarityValue::UInt(n) => {
            out.push(TYPE_UINT);
            out.extend_from_slice(&n.to_be_bytes());
        }
        ClarityValue::Buffer(bytes) => {
            out.push(TYPE_BUFFER);
            write_len(bytes.len(), out)?;
            out.extend_from_slice(bytes);
        }
        ClarityValue::Bool(true) => out.push(TYPE_TRUE),
        ClarityValue::Bool(false) => out.push(TYPE_FALSE),
        ClarityValue::StandardPrincipal(p) => {
            out.push(TYPE_STANDARD_PRINCIPAL);
            write_principal(p, out);
        }
        ClarityValue::ContractPrincipal { issuer, name } => {
            out.push(TYPE_CONTRACT_PRINCIPAL);
            write_principal(issuer, out);
            write_name(name, out)?;
        }
        ClarityValue::ResponseOk(inner) => {
            out.push(TYPE_RESPONSE_OK);
            write_value(inner, out)?;
        }
        ClarityValue::ResponseErr(inner) => {
            out.push(TYPE_RESPONSE_ERR);
            write_value(inner, out)?;
        }
        ClarityValue::OptionalNone => out.push(TYPE_OPTIONAL_NONE),
        ClarityValue::OptionalSome(inner) => {
            out.push(TYPE_OPTIONAL_SOME);
            write_value(inner, out)?;
        }
        ClarityValue::List(items) => {
            out.push(TYPE_LIST);
            write_len(items.len(), out)?;
            for item in items {
                write_value(item, out)?;
            }
        }
        ClarityValue::Tuple(fields) => {
            out.push(TYPE_TUPLE);
            write_len(fields.len(), out)?;
            for (name, field) in fields {
                write_name(name, out)?;
                write_value(field, out)?;
            }
        }
        ClarityValue::StringAscii(s) => {
            if !s.is_ascii() {
                return Err(ClarityError::NotAscii);
            }
            out.push(TYPE_STRING_ASCII);
            write_len(s.len(), out)?;
            out.extend_from_slice(s.as_bytes());
        }
        ClarityValue::StringUtf8(s) => {
            out.push(TYPE_STRING_UTF8);
            write_len(s.len(), out)?;
            out.extend_from_slice(s.as_bytes());
        }
    }
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], ClarityError> {
        let available = self.bytes.len() - self.pos;
        if n > available {
            return Err(ClarityError::Truncated {
                offset: self.pos,
                needed: n - available,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8, ClarityError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<usize, ClarityError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf) as usize)
    }

    fn sixteen(&mut self) -> Result<[u8; 16], ClarityError> {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(self.take(16)?);
        Ok(buf)
    }

    fn principal(&mut self) -> Result<StandardPrincipal, ClarityError> {
        let version = self.byte()?;
        let mut hash160 = [0u8; c32::HASH160_LEN];
        hash160.copy_from_slice(self.take(c32::HASH160_LEN)?);
        Ok(StandardPrincipal { version, hash160 })
    }

    fn name(&mut self) -> Result<String, ClarityError> {
        let len = self.byte()? as usize;
        let raw = self.take(len)?;
        if !raw.is_ascii() {
            return Err(ClarityError::NotAscii);
        }
        String::from_utf8(raw.to_vec()).map_err(|_| ClarityError::NotAscii)
    }

    fn value(&mut self, depth: usize) -> Result<ClarityValue, ClarityError> {
        if depth > MAX_VALUE_DEPTH {
            return Err(ClarityError::TooDeep(MAX_VALUE_DEPTH));
        }
        let prefix = self.byte()?;
        let value = match prefix {
            TYPE_INT => ClarityValue::Int(i128::from_be_bytes(self.sixteen()?)),
            TYPE_UINT => ClarityValue::UInt(u128::from_be_bytes(self.sixteen()?)),
            TYPE_BUFFER => {
                let len = self.u32()?;
                ClarityValue::Buffer(self.take(len)?.to_vec())
            }
            TYPE_TRUE => ClarityValue::Bool(true),
            TYPE_FALSE => ClarityValue::Bool(false),
            TYPE_STANDARD_PRINCIPAL => ClarityValue::StandardPrincipal(self.principal()?),
            TYPE_CONTRACT_PRINCIPAL => {
                let issuer = self.principal()?;
                let name = self.name()?;
                ClarityValue::ContractPrincipal { issuer, name }
            }
            TYPE_RESPONSE_OK => ClarityValue::ResponseOk(Box::new(self.value(depth + 1)?)),
            TYPE_RESPONSE_ERR => ClarityValue::ResponseErr(Box::new(self.value(depth + 1)?)),
            TYPE_OPTIONAL_NONE => ClarityValue::OptionalNone,
            TYPE_OPTIONAL_SOME => ClarityValue::OptionalSome(Box::new(self.value(depth + 1)?)),
            TYPE_LIST => {
                let len = self.u32()?;
                // Every element needs at least one byte; reject impossible lengths up front.
                if len > self.bytes.len() - self.pos {
                    return Err(ClarityError::Truncated {
                        offset: self.pos,
                        needed: len - (self.bytes.len() - self.pos),
                    });
                }
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.value(depth + 1)?);
                }
                ClarityValue::List(items)
            }
            TYPE_TUPLE => {
                let len = self.u32()?;
                let mut fields = BTreeMap::new();
                for _ in 0..len {
                    let name = self.name()?;
                    let field = self.value(depth + 1)?;
                    fields.insert(name, field);
                }
                ClarityValue::Tuple(fields)
            }
            TYPE_STRING_ASCII => {
                let len = self.u32()?;
                let raw = self.take(len)?;
                if !raw.is_ascii() {
                    return Err(ClarityError::NotAscii);
                }
                ClarityValue::StringAscii(
                    String::from_utf8(raw.to_vec()).map_err(|_| ClarityError::NotAscii)?,
                )
            }
            TYPE_STRING_UTF8 => {
                let len = self.u32()?;
                let raw = self.take(len)?;
                ClarityValue::StringUtf8(
                    String::from_utf8(raw.to_vec()).map_err(|_| ClarityError::InvalidUtf8)?,
                )
            }
            other => return Err(ClarityError::UnknownPrefix(other)),
        };
        Ok(value)
    }
}
