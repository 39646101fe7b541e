//! Textbook RSA: key generation, block-chunked stream encryption and
//! identity signatures over raw modular exponentiation. No padding.

pub mod cipher;
pub mod error;
pub mod io;
pub mod keygen;
pub mod numtheory;
pub mod randstate;
pub mod sig;
pub mod util;

pub use cipher::{block_size, decrypt_file, encrypt_file};
pub use error::{Result, RsaError};
pub use io::{PrivateKey, PublicKey};
pub use keygen::{generate_keypair, KeyPair, KeygenParams};
pub use randstate::RandState;
pub use sig::{identity_to_int, sign, verify};
