use anyhow::Context;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tokens are issued by the external auth service; this side only verifies them.
#[derive(Clone)]
pub struct JwtServiceConfig {
    pub secret: String,
    pub audience: String,
}

#[derive(Clone)]
pub struct JwtService {
    decoding: DecodingKey,
    validation: Validation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<usize>,
}

impl JwtService {
    pub fn new(config: &JwtServiceConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.as_str()]);
        let decoding = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            decoding,
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .context("failed to verify JWT")
    }
}
