use thiserror::Error;

/// Failures while encoding or decoding Clarity wire values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClarityError {
    #[error("unexpected end of input: needed {needed} more bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("unknown type prefix 0x{0:02x}")]
    UnknownPrefix(u8),

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("string-ascii contains a non-ascii character")]
    NotAscii,

    #[error("string-utf8 is not valid utf-8")]
    InvalidUtf8,

    #[error("invalid principal: {0}")]
    InvalidPrincipal(String),

    #[error("value too long: {0} bytes")]
    TooLong(usize),

    #[error("value nesting exceeds {0} levels")]
    TooDeep(usize),
}

/// Failures from the read-only call transport.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("node rejected call: {0}")]
    Rejected(String),

    #[error("malformed response: {0}")]
    Decode(#[from] ClarityError),

    #[error("{0}")]
    Other(String),
}

/// Failures reading or writing client-local preferences.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("preference file i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("preference file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of the external wallet's signing flow when it does not produce a
/// transaction id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("user cancelled the signing request")]
    Cancelled,

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown network '{0}', expected 'testnet' or 'mainnet'")]
    UnknownNetwork(String),
}
