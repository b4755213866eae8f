use std::time::Duration;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use agora_types::api::Claims;
use agora_types::models::Identity;

use crate::error::{PostError, PostResult};

pub trait IdentityVerifier: Send + Sync {
    /// Returns the caller behind `credential`, or `None` if it does not verify.
    fn verify(&self, credential: &str) -> Option<Identity>;
}

/// HS256 bearer tokens signed with a shared secret.
pub struct JwtVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Mints a token for `identity` that expires after `ttl`.
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> anyhow::Result<String> {
        let ttl = chrono::Duration::from_std(ttl)?;
        let claims = Claims {
            sub: identity.id.clone(),
            name: identity.name.clone(),
            role: identity.role,
            exp: (chrono::Utc::now() + ttl).timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, credential: &str) -> Option<Identity> {
        match decode::<Claims>(credential, &self.decoding, &Validation::default()) {
            Ok(data) => Some(Identity {
                id: data.claims.sub,
                name: data.claims.name,
                role: data.claims.role,
            }),
            Err(e) => {
                debug!("Rejected credential: {}", e);
                None
            }
        }
    }
}

/// Turns the raw credential of a request into a verified caller.
pub fn authenticate(verifier: &dyn IdentityVerifier, credential: Option<&str>) -> PostResult<Identity> {
    let credential = credential
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(PostError::Unauthenticated)?;

    verifier.verify(credential).ok_or(PostError::InvalidCredential)
}
