//! Crockford-style base32 ("c32") and c32check, the encoding behind Stacks
//! addresses such as `SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7`.

use sha2::{Digest, Sha256};

use crate::error::ClarityError;

const C32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const CHECKSUM_LEN: usize = 4;
pub const HASH160_LEN: usize = 20;

fn c32_digit(c: char) -> Option<u8> {
    let normalized = match c.to_ascii_uppercase() {
        'O' => '0',
        'L' | 'I' => '1',
        other => other,
    };
    C32_ALPHABET
        .iter()
        .position(|&a| a as char == normalized)
        .map(|p| p as u8)
}

/// Encodes bytes as a big-endian base32 number. Each leading zero byte is
/// kept as one leading `'0'` digit.
pub fn c32_encode(data: &[u8]) -> String {
    let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 8 / 5 + 1);
    let mut acc: u32 = 0;
    let mut bits = 0;
    for &byte in data.iter().rev() {
        acc |= (byte as u32) << bits;
        bits += 8;
        while bits >= 5 {
            digits.push((acc & 0x1f) as u8);
            acc >>= 5;
            bits -= 5;
        }
    }
    if bits > 0 {
        digits.push((acc & 0x1f) as u8);
    }
    while digits.last() == Some(&0) {
        digits.pop();
    }
    let leading_zero_bytes = data.iter().take_while(|b| **b == 0).count();
    digits.extend(std::iter::repeat(0).take(leading_zero_bytes));

    digits
        .iter()
        .rev()
        .map(|&d| C32_ALPHABET[d as usize] as char)
        .collect()
}

pub fn c32_decode(input: &str) -> Result<Vec<u8>, ClarityError> {
    let digits = input
        .chars()
        .map(|c| {
            c32_digit(c).ok_or_else(|| {
                ClarityError::InvalidPrincipal(format!("'{}' is not a c32 character", c))
            })
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let mut bytes: Vec<u8> = Vec::with_capacity(digits.len() * 5 / 8 + 1);
    let mut acc: u32 = 0;
    let mut bits = 0;
    for &digit in digits.iter().rev() {
        acc |= (digit as u32) << bits;
        bits += 5;
        if bits >= 8 {
            bytes.push((acc & 0xff) as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 && acc != 0 {
        bytes.push((acc & 0xff) as u8);
    }
    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    let leading_zero_digits = digits.iter().take_while(|d| **d == 0).count();
    bytes.extend(std::iter::repeat(0).take(leading_zero_digits));
    bytes.reverse();
    Ok(bytes)
}

fn checksum(version: u8, data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut first = Sha256::new();
    first.update([version]);
    first.update(data);
    let second = Sha256::digest(first.finalize());
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&second[..CHECKSUM_LEN]);
    out
}

pub fn c32check_encode(version: u8, data: &[u8]) -> Result<String, ClarityError> {
    if version >= 32 {
        return Err(ClarityError::InvalidPrincipal(format!(
            "version {} does not fit one c32 digit",
            version
        )));
    }
    let mut payload = data.to_vec();
    payload.extend_from_slice(&checksum(version, data));
    let mut out = String::with_capacity(payload.len() * 8 / 5 + 2);
    out.push(C32_ALPHABET[version as usize] as char);
    out.push_str(&c32_encode(&payload));
    Ok(out)
}

pub fn c32check_decode(input: &str) -> Result<(u8, Vec<u8>), ClarityError> {
    let mut chars = input.chars();
    let version_char = chars
        .next()
        .ok_or_else(|| ClarityError::InvalidPrincipal("empty c32check string".to_string()))?;
    let version = c32_digit(version_char).ok_or_else(|| {
        ClarityError::InvalidPrincipal(format!("'{}' is not a c32 version", version_char))
    })?;
    let payload = c32_decode(chars.as_str())?;
    if payload.len() < CHECKSUM_LEN {
        return Err(ClarityError::InvalidPrincipal("missing checksum".to_string()));
    }
    let (data, sum) = payload.split_at(payload.len() - CHECKSUM_LEN);
    if sum != checksum(version, data) {
        return Err(ClarityError::InvalidPrincipal(format!(
            "checksum mismatch in '{}'",
            input
        )));
    }
    Ok((version, data.to_vec()))
}

/// Renders a standard principal, e.g. `ST...` on testnet or `SP...` on mainnet.
pub fn c32_address(version: u8, hash160: &[u8; HASH160_LEN]) -> Result<String, ClarityError> {
    Ok(format!("S{}", c32check_encode(version, hash160)?))
}

pub fn parse_c32_address(address: &str) -> Result<(u8, [u8; HASH160_LEN]), ClarityError> {
    let body = address
        .strip_prefix('S')
        .ok_or_else(|| ClarityError::InvalidPrincipal(format!("'{}' must start with 'S'", address)))?;
    let (version, data) = c32check_decode(body)?;
    if data.len() > HASH160_LEN {
        return Err(ClarityError::InvalidPrincipal(format!(
            "'{}' carries {} bytes, expected {}",
            address,
            data.len(),
            HASH160_LEN
        )));
    }
    let mut hash160 = [0u8; HASH160_LEN];
    hash160[HASH160_LEN - data.len()..].copy_from_slice(&data);
    Ok((version, hash160))
}
