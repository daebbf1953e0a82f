use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::gateway::StoreGateway;

/// How bearer tokens issued by the auth service are checked.
#[derive(Clone)]
pub struct SessionKeys {
    pub decoding: DecodingKey,
    pub validation: Validation,
}

impl SessionKeys {
    pub fn hs256(secret: &str, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn StoreGateway>,
    pub sessions: Arc<SessionKeys>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn StoreGateway>, sessions: SessionKeys) -> Self {
        Self {
            gateway,
            sessions: Arc::new(sessions),
        }
    }
}
