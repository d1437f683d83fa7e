use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::errors::AppError;

type HmacSha1 = Hmac<Sha1>;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn sign(secret: &str, user_id: &str) -> Option<HmacSha1> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(user_id.as_bytes());
    Some(mac)
}

/// Session token: `<user_id>.<base64url(hmac-sha1(secret, user_id))>`.
pub fn issue_token(secret: &str, user_id: &str) -> String {
    let sig = sign(secret, user_id)
        .map(|mac| base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("{user_id}.{sig}")
}

/// Returns the user id a token was issued for, if the signature holds.
pub fn verify_token(secret: &str, token: &str) -> Option<String> {
    let (user_id, sig) = token.rsplit_once('.')?;
    if user_id.is_empty() {
        return None;
    }
    let sig = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(sig).ok()?;
    sign(secret, user_id)?.verify_slice(&sig).ok()?;
    Some(user_id.to_string())
}

/// Pulls the bearer token out of an `Authorization` header value.
pub fn bearer(header: Option<&str>) -> Result<&str, AppError> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)
}
