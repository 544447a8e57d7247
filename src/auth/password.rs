use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Passwords are compared on their first 72 bytes only, the bcrypt limit the
/// account data was created under.
pub const MAX_PASSWORD_BYTES: usize = 72;

fn truncated(plain: &str) -> &[u8] {
    let bytes = plain.as_bytes();
    &bytes[..bytes.len().min(MAX_PASSWORD_BYTES)]
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(truncated(plain), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(truncated(plain), &parsed)
        .is_ok())
}
