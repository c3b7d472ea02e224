use actix_web::{HttpMessage, HttpResponse, dev::ServiceRequest};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::{Engine, engine::general_purpose};

use crate::error::{AppError, Res};

/// Marks SDK keys so they can be told apart from other secrets.
pub const API_KEY_PREFIX: &str = "sk-sdk-";
const API_KEY_BYTES: usize = 24;

/// Opaque SDK credential as presented in the `X-API-Key` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a fresh key from OS randomness.
    pub fn generate() -> Self {
        let mut bytes = [0u8; API_KEY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        ApiKey(format!(
            "{}{}",
            API_KEY_PREFIX,
            general_purpose::URL_SAFE_NO_PAD.encode(bytes)
        ))
    }

    /// Checks the shape of a presented key. Existence is checked against the store later.
    pub fn parse(key: &str) -> Res<Self> {
        let key = key.trim();
        match key.strip_prefix(API_KEY_PREFIX) {
            Some(secret) if !secret.is_empty() => Ok(ApiKey(key.to_string())),
            _ => Err(AppError::Unauthorized("Invalid API key".to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn get_api_key_or_error(req: &ServiceRequest) -> Result<ApiKey, HttpResponse> {
    if let Some(key_res) = req.extensions().get::<Res<ApiKey>>() {
        match key_res {
            Ok(key) => Ok(key.clone()),
            Err(app_error) => Err(app_error.to_http_response()),
        }
    } else {
        Err(AppError::Unauthorized("API key required".to_string()).to_http_response())
    }
}
