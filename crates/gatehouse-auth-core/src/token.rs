//! Signed session tokens
//!
//! A token is a compact HS256 JWT:
//! `base64url(header) "." base64url(claims) "." base64url(hmac_sha256(header "." claims))`
//! where the claims are `{"payload": <IdentityPayload>, "exp": <unix seconds>}`.
//!
//! Verification order is fixed: split into three parts, check the signature
//! over the received text, then decode, then check expiry. Any change to the
//! first two parts is therefore reported as a signature mismatch before any
//! decoding happens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use gatehouse_types::UserId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::crypto::{constant_time_eq, HmacKey};
use crate::secret::SecretProvider;
use crate::{AuthError, TokenError};

/// The only signing algorithm accepted
const ALGORITHM: &str = "HS256";

/// Identity fields embedded in a token.
///
/// Only `id` is trusted. `name` and `email` are a display shortcut and must
/// never drive authorization; the user record is re-loaded by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPayload {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl IdentityPayload {
    /// Payload carrying only the identifier
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            name: None,
            email: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Opaque signed token string
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens are bearer credentials; keep them out of debug logs
impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("length", &self.0.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default)]
    typ: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    payload: IdentityPayload,
    exp: i64,
}

/// Issues and verifies signed tokens with one shared secret
#[derive(Clone)]
pub struct TokenCodec {
    key: HmacKey,
    clock: Arc<dyn Clock>,
    encoded_header: Arc<str>,
}

impl TokenCodec {
    /// Create a codec using the wall clock.
    ///
    /// # Errors
    /// Returns [`AuthError::Configuration`] if the secret is shorter than 32 bytes.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, AuthError> {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    /// Create a codec with an explicit clock
    pub fn with_clock(secret: impl AsRef<[u8]>, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        let key = HmacKey::new(secret).map_err(|e| AuthError::Configuration(e.to_string()))?;
        let header = serde_json::to_vec(&Header {
            alg: ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        })
        .map_err(|e| AuthError::Internal(format!("failed to encode token header: {e}")))?;

        Ok(Self {
            key,
            clock,
            encoded_header: Arc::from(URL_SAFE_NO_PAD.encode(header)),
        })
    }

    /// Create a codec reading the secret from a provider once, at construction
    pub fn from_provider(
        provider: &dyn SecretProvider,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        Self::with_clock(provider.current_secret(), clock)
    }

    /// The clock this codec checks expiry against
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Sign `payload` with an expiry.
    ///
    /// Deterministic: the same payload, expiry and secret always produce the
    /// same token. The expiry is carried at one-second resolution.
    pub fn issue(
        &self,
        payload: &IdentityPayload,
        expires_at: DateTime<Utc>,
    ) -> Result<Token, AuthError> {
        let claims = Claims {
            payload: payload.clone(),
            exp: expires_at.timestamp(),
        };
        let claims_json = serde_json::to_vec(&claims).map_err(|e| {
            tracing::error!("Failed to serialize token claims: {}", e);
            AuthError::Internal("Failed to issue token".to_string())
        })?;

        let signing_input = format!(
            "{}.{}",
            self.encoded_header,
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let signature = self.signature_for(&signing_input);

        Ok(Token(format!("{signing_input}.{signature}")))
    }

    /// Verify a token and return its payload.
    ///
    /// # Errors
    /// - [`TokenError::Malformed`] if the token has no signature part, or a
    ///   correctly signed token does not split into header and claims that decode
    /// - [`TokenError::InvalidSignature`] if the signature over everything before
    ///   the last `.` does not match
    /// - [`TokenError::Expired`] if now is at or past the expiry
    pub fn verify(&self, token: &str) -> Result<IdentityPayload, TokenError> {
        let result = self.verify_inner(token);
        if let Err(err) = &result {
            tracing::debug!(reason = err.reason(), "Session token rejected");
            metrics::counter!("auth_token_rejections_total", "reason" => err.reason())
                .increment(1);
        }
        result
    }

    fn verify_inner(&self, token: &str) -> Result<IdentityPayload, TokenError> {
        // The signature covers everything before the last dot, so any change to
        // the signed text (separators included) is a signature mismatch
        let (signing_input, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        let expected = self.signature_for(signing_input);
        if !constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
            return Err(TokenError::InvalidSignature);
        }

        let (header_b64, claims_b64) = signing_input
            .split_once('.')
            .ok_or(TokenError::Malformed)?;
        let header: Header = decode_part(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::Malformed);
        }

        let claims: Claims = decode_part(claims_b64)?;
        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)?;
        if self.clock.now() >= expires_at {
            return Err(TokenError::Expired);
        }

        Ok(claims.payload)
    }

    fn signature_for(&self, signing_input: &str) -> String {
        URL_SAFE_NO_PAD.encode(self.key.sign(signing_input.as_bytes()))
    }
}

fn decode_part<T: serde::de::DeserializeOwned>(part: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(part)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
