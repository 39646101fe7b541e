use thiserror::Error;

pub type Result<T> = std::result::Result<T, RsaError>;

#[derive(Debug, Error)]
pub enum RsaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("key size of {bits} bits is below the minimum of {min} bits")]
    KeyTooSmall { bits: u64, min: u64 },

    #[error("cannot search for a prime of {0} bits")]
    InvalidBitLength(u64),

    #[error("Miller-Rabin needs at least one iteration")]
    InvalidIterations,

    #[error("no {bits}-bit prime found after {attempts} candidates")]
    PrimeSearchExhausted { bits: u64, attempts: u64 },

    #[error("value is not invertible modulo the totient")]
    NotInvertible,

    #[error("malformed hexadecimal on line {line}: `{text}`")]
    MalformedHex { line: usize, text: String },

    #[error("key file is missing the `{0}` field")]
    MissingField(&'static str),

    #[error("value is not smaller than the modulus")]
    ValueOutOfRange,

    #[error("block on line {line} does not start with the 0xFF marker")]
    CorruptBlock { line: usize },

    #[error("identity `{0}` is not a base-62 string")]
    InvalidIdentity(String),

    #[error("modulus of {bits} bits is too small to carry a block")]
    ModulusTooSmall { bits: u64 },
}
