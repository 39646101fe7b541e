//! RSA cipher and decipher over byte streams
//!
//! plaintext bytes -> blocks -> cipher -> one hex integer per line
//! hex lines -> decipher -> blocks -> plaintext bytes
//!
//! Ciphering a block: c = m^e mod n
//! Deciphering a block: m = c^d mod n
//!
//! Each block is the marker byte 0xFF followed by up to `block_size - 1` bytes of
//! payload. With `block_size` = (bits(n) - 1) / 8 the block integer stays below `n`,
//! and the marker keeps leading zero bytes of the payload from vanishing when the
//! deciphered integer is exported back to bytes.

use log::{debug, trace};
use num_bigint::BigUint;
use std::io::{BufRead, Read, Write};

use crate::error::{Result, RsaError};
use crate::numtheory::pow_mod;

pub const BLOCK_MARKER: u8 = 0xFF;

/// block size in bytes for modulus `n`, marker included
pub fn block_size(n: &BigUint) -> usize {
    (n.bits().saturating_sub(1) / 8) as usize
}

/// c = m^e mod n
pub fn encrypt(m: &BigUint, e: &BigUint, n: &BigUint) -> BigUint {
    pow_mod(m, e, n)
}

/// m = c^d mod n
pub fn decrypt(c: &BigUint, d: &BigUint, n: &BigUint) -> BigUint {
    pow_mod(c, d, n)
}

/// Encrypts `input` until EOF, writing one lowercase hex integer per line.
/// Returns the number of blocks written.
pub fn encrypt_file<R: Read, W: Write>(
    input: &mut R,
    output: &mut W,
    n: &BigUint,
    e: &BigUint,
) -> Result<usize> {
    let k = block_size(n);
    if k < 2 {
        return Err(RsaError::ModulusTooSmall { bits: n.bits() });
    }

    let mut block = Vec::with_capacity(k);
    let mut blocks = 0usize;
    loop {
        block.clear();
        block.push(BLOCK_MARKER);
        let read = input.by_ref().take(k as u64 - 1).read_to_end(&mut block)?;
        if read == 0 {
            break;
        }

        let m = BigUint::from_bytes_be(&block);
        let c = encrypt(&m, e, n);
        writeln!(output, "{:x}", c)?;

        blocks += 1;
        trace!("block {blocks}: {read} bytes");
    }
    output.flush()?;

    debug!("encrypted {blocks} blocks of up to {} bytes", k - 1);
    Ok(blocks)
}

/// Decrypts hex lines from `input` until EOF, writing the payload bytes.
/// Returns the number of blocks read. Blank lines are skipped.
pub fn decrypt_file<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    n: &BigUint,
    d: &BigUint,
) -> Result<usize> {
    let mut blocks = 0usize;
    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let c = parse_hex(text, idx + 1)?;
        if c >= *n {
            return Err(RsaError::ValueOutOfRange);
        }

        let m = decrypt(&c, d, n).to_bytes_be();
        match m.split_first() {
            Some((&BLOCK_MARKER, payload)) => output.write_all(payload)?,
            _ => return Err(RsaError::CorruptBlock { line: idx + 1 }),
        }

        blocks += 1;
        trace!("block {blocks}: {} bytes", m.len() - 1);
    }
    output.flush()?;

    debug!("decrypted {blocks} blocks");
    Ok(blocks)
}

/// Parses one hex integer; `line` is 1-based and only used for the error.
pub fn parse_hex(text: &str, line: usize) -> Result<BigUint> {
    let malformed = || RsaError::MalformedHex {
        line,
        text: text.to_string(),
    };

    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed());
    }
    BigUint::parse_bytes(text.as_bytes(), 16).ok_or_else(malformed)
}
