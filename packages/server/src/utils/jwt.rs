use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Fixed subject; this service has a single admin
    pub exp: usize,  // Expiration timestamp
}

pub const ADMIN_SUBJECT: &str = "admin";

/// Sign a new admin token.
pub fn sign(secret: &str) -> Result<String> {
    let expiration = (Utc::now() + Duration::days(7)).timestamp();

    let claims = Claims {
        sub: ADMIN_SUBJECT.to_owned(),
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode an admin token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
