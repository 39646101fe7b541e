//! Key file I/O
//!
//! Public key file: n, e, s as lowercase hex, then the identity, one per line.
//! Private key file: n, d as lowercase hex, one per line.
//!
//! Readers split on whitespace, so trailing newlines or blank lines are fine.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use num_bigint::BigUint;
use sha2::{Digest, Sha256};
use std::io::{Read, Write};

use crate::cipher::parse_hex;
use crate::error::{Result, RsaError};
use crate::sig::{identity_to_int, verify};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub n: BigUint,
    pub e: BigUint,
    pub s: BigUint, // signature over `username`
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKey {
    pub n: BigUint,
    pub d: BigUint,
}

impl PublicKey {
    /// Checks that `s` is a signature over `username` under this key.
    pub fn verify(&self) -> Result<bool> {
        let m = identity_to_int(&self.username)?;
        Ok(verify(&m, &self.s, &self.e, &self.n))
    }

    /// `SHA256:` followed by the unpadded base64 digest of n || e (big-endian)
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.n.to_bytes_be());
        hasher.update(self.e.to_bytes_be());
        format!("SHA256:{}", STANDARD_NO_PAD.encode(hasher.finalize()))
    }

    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{:x}", self.n)?;
        writeln!(out, "{:x}", self.e)?;
        writeln!(out, "{:x}", self.s)?;
        writeln!(out, "{}", self.username)?;
        out.flush()?;
        Ok(())
    }

    pub fn read<R: Read>(input: &mut R) -> Result<Self> {
        let text = read_text(input)?;
        let mut fields = Fields::new(&text);

        Ok(PublicKey {
            n: fields.hex("n")?,
            e: fields.hex("e")?,
            s: fields.hex("s")?,
            username: fields.next("username")?.to_string(),
        })
    }
}

impl PrivateKey {
    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{:x}", self.n)?;
        writeln!(out, "{:x}", self.d)?;
        out.flush()?;
        Ok(())
    }

    pub fn read<R: Read>(input: &mut R) -> Result<Self> {
        let text = read_text(input)?;
        let mut fields = Fields::new(&text);

        Ok(PrivateKey {
            n: fields.hex("n")?,
            d: fields.hex("d")?,
        })
    }
}

fn read_text<R: Read>(input: &mut R) -> Result<String> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    Ok(text)
}

/// Whitespace-separated tokens, remembering the 1-based line of each.
struct Fields<'a> {
    tokens: std::vec::IntoIter<(usize, &'a str)>,
}

impl<'a> Fields<'a> {
    fn new(text: &'a str) -> Self {
        let tokens: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .flat_map(|(idx, line)| line.split_whitespace().map(move |t| (idx + 1, t)))
            .collect();
        Fields {
            tokens: tokens.into_iter(),
        }
    }

    fn next_with_line(&mut self, name: &'static str) -> Result<(usize, &'a str)> {
        self.tokens.next().ok_or(RsaError::MissingField(name))
    }

    fn next(&mut self, name: &'static str) -> Result<&'a str> {
        self.next_with_line(name).map(|(_, token)| token)
    }

    fn hex(&mut self, name: &'static str) -> Result<BigUint> {
        let (line, token) = self.next_with_line(name)?;
        parse_hex(token, line)
    }
}
