//! JWT session token handling

use crate::auth::clock::{Clock, SystemClock};
use crate::auth::models::{User, UserInfo, UserRole};
use crate::error::Result;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const INSECURE_DEFAULT_SECRET: &str = "storefront-auth-insecure-default-change-in-production";

/// Where the token signing secret came from.
///
/// `InsecureDefault` means anyone who has read this source can forge tokens;
/// callers are expected to warn loudly when they see it.
#[derive(Clone, PartialEq, Eq)]
pub enum SigningKeySource {
    Configured(String),
    InsecureDefault,
}

impl SigningKeySource {
    /// Resolve from an optional configured secret. Blank secrets count as absent.
    pub fn from_config(secret: Option<&str>) -> Self {
        match secret.map(str::trim) {
            Some(s) if !s.is_empty() => Self::Configured(s.to_string()),
            _ => Self::InsecureDefault,
        }
    }

    pub fn is_insecure(&self) -> bool {
        matches!(self, Self::InsecureDefault)
    }

    fn secret(&self) -> &[u8] {
        match self {
            Self::Configured(s) => s.as_bytes(),
            Self::InsecureDefault => INSECURE_DEFAULT_SECRET.as_bytes(),
        }
    }
}

impl fmt::Debug for SigningKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured(_) => write!(f, "Configured([redacted])"),
            Self::InsecureDefault => write!(f, "InsecureDefault"),
        }
    }
}

/// Who a token is about. Everything in a session except the timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

impl From<&User> for SessionIdentity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            phone: user.phone.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// JWT claims. The field set is closed: tokens carrying anything else are rejected.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Display name
    pub name: String,
    pub email: String,
    /// User role
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

impl Claims {
    fn new(identity: &SessionIdentity, iat: i64, exp: i64) -> Self {
        Self {
            sub: identity.id.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
            role: identity.role,
            phone: identity.phone.clone(),
            avatar: identity.avatar.clone(),
            iat,
            exp,
        }
    }

    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            id: self.sub.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            phone: self.phone.clone(),
            avatar: self.avatar.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&Claims> for UserInfo {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.sub.clone(),
            name: claims.name.clone(),
            email: claims.email.clone(),
            role: claims.role.to_string(),
            phone: claims.phone.clone(),
            avatar: claims.avatar.clone(),
        }
    }
}

/// A freshly signed token and the claims inside it
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Signs and verifies session tokens (HS256)
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(source: &SigningKeySource) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    pub fn with_clock(source: &SigningKeySource, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against our own clock with no leeway
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding: EncodingKey::from_secret(source.secret()),
            decoding: DecodingKey::from_secret(source.secret()),
            validation,
            clock,
        }
    }

    /// Sign a token for `identity`, valid for `validity` from now
    pub fn issue(&self, identity: &SessionIdentity, validity: Duration) -> Result<IssuedToken> {
        let iat = self.clock.now().timestamp();
        let exp = iat.saturating_add(i64::try_from(validity.as_secs()).unwrap_or(i64::MAX));
        let claims = Claims::new(identity, iat, exp);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(IssuedToken { token, claims })
    }

    /// Decode a token. Bad signatures, malformed input and expired tokens all give `None`.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let claims = match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                return None;
            }
        };

        if self.clock.now().timestamp() >= claims.exp {
            tracing::debug!(sub = %claims.sub, "Session token expired");
            return None;
        }

        Some(claims)
    }
}
