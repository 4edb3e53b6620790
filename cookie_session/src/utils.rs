use http::header::{HeaderMap, HeaderValue, SET_COOKIE};
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;

const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Shortest random body of a generated session id (prefix excluded)
pub const SESSION_ID_MIN_LEN: usize = 41;
/// Longest random body of a generated session id (prefix excluded)
pub const SESSION_ID_MAX_LEN: usize = 50;

// Largest multiple of 62 that fits in a byte; anything above is rejected to avoid modulo bias.
const BASE62_ACCEPT_BELOW: u8 = 248;

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Cookie error: {0}")]
    Cookie(String),
}

fn fill_random(rng: &SystemRandom, buf: &mut [u8]) -> Result<(), UtilError> {
    rng.fill(buf)
        .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))
}

/// Uniform random number in `0..n` without modulo bias.
fn random_below(rng: &SystemRandom, n: u16) -> Result<u16, UtilError> {
    let limit = 256 - (256 % n);
    loop {
        let mut byte = [0u8; 1];
        fill_random(rng, &mut byte)?;
        let value = u16::from(byte[0]);
        if value < limit {
            return Ok(value % n);
        }
    }
}

/// Random base62 string of exactly `len` characters.
pub fn gen_base62_string(len: usize) -> Result<String, UtilError> {
    let rng = SystemRandom::new();
    base62_from(&rng, len)
}

fn base62_from(rng: &SystemRandom, len: usize) -> Result<String, UtilError> {
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 64];
    while out.len() < len {
        fill_random(rng, &mut buf)?;
        for byte in buf.iter().filter(|b| **b < BASE62_ACCEPT_BELOW) {
            out.push(BASE62[usize::from(*byte % 62)] as char);
            if out.len() == len {
                break;
            }
        }
    }
    Ok(out)
}

/// Generate a new session identifier: `prefix` followed by 41 to 50 base62 characters.
pub fn gen_session_id(prefix: &str) -> Result<String, UtilError> {
    let rng = SystemRandom::new();
    let span = (SESSION_ID_MAX_LEN - SESSION_ID_MIN_LEN + 1) as u16;
    let len = SESSION_ID_MIN_LEN + usize::from(random_below(&rng, span)?);
    let body = base62_from(&rng, len)?;
    Ok(format!("{prefix}{body}"))
}

pub(crate) fn header_append_set_cookie(
    headers: &mut HeaderMap,
    cookie: &str,
) -> Result<(), UtilError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|_| UtilError::Cookie("Failed to parse cookie".to_string()))?;
    headers.append(SET_COOKIE, value);
    Ok(())
}
