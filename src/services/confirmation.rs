//! One-time confirmation codes
//!
//! Codes are six random digits. Only their Argon2id hash is stored, so a
//! leaked database does not reveal codes that are still valid.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};

pub const CODE_LENGTH: usize = 6;

/// A uniformly random six digit code, zero padded.
pub fn generate_code() -> String {
    // Rejection sampling keeps the distribution uniform
    const RANGE: u32 = 1_000_000;
    const LIMIT: u32 = u32::MAX - (u32::MAX % RANGE);
    loop {
        let value = OsRng.next_u32();
        if value < LIMIT {
            return format!("{:06}", value % RANGE);
        }
    }
}

pub fn hash_code(code: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(code.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash confirmation code: {}", e))?;
    Ok(hash.to_string())
}

/// Check `code` against a stored hash. A malformed hash is an error,
/// a mismatch is `Ok(false)`.
pub fn verify_code(code: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid confirmation code hash: {}", e))
        .context("Failed to parse confirmation code hash")?;

    match Argon2::default().verify_password(code.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Confirmation code verification failed: {}", e)),
    }
}
