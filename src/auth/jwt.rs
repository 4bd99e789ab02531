use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::{claims::Claims, clock::Clock, error::AuthError};
use crate::config::{JwtConfig, DEFAULT_TTL_MINUTES};

/// Latest expiry a token can carry; longer lifetimes are clamped to it.
pub const MAX_EXPIRY: OffsetDateTime = time::macros::datetime!(9999-12-31 23:59:59 UTC);

/// Signing material and token policy, built once from [`JwtConfig`] at startup.
///
/// The secret is fixed for the life of the process. Restarting with a different
/// `JWT_SECRET` invalidates every token signed with the previous one.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub default_ttl: Duration,
}

/// A freshly signed token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

// non-positive or overflowing minute counts fall back to the default lifetime
fn ttl_from_minutes(minutes: i64) -> Duration {
    u64::try_from(minutes)
        .ok()
        .filter(|m| *m > 0)
        .and_then(|m| m.checked_mul(60))
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_TTL_MINUTES as u64 * 60))
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            default_ttl: ttl_from_minutes(cfg.ttl_minutes),
        }
    }

    /// Signs a token for `subject` valid until `now + ttl` (default ttl when `None`).
    /// An expiry past [`MAX_EXPIRY`] is clamped to it.
    pub fn issue(
        &self,
        clock: &dyn Clock,
        subject: &str,
        ttl: Option<Duration>,
    ) -> Result<IssuedToken, AuthError> {
        if subject.is_empty() {
            return Err(AuthError::EmptySubject);
        }
        let now = clock.now();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let expires_at = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .map_or(MAX_EXPIRY, |exp| exp.min(MAX_EXPIRY));
        let claims = Claims {
            sub: subject.to_owned(),
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("jwt encode: {e}")))?;
        debug!(sub = %claims.sub, exp = claims.exp, "jwt signed");
        Ok(IssuedToken { token, expires_at })
    }

    /// Returns the subject of a token whose signature, issuer and audience check
    /// out and whose expiry is strictly after `clock.now()`.
    pub fn verify(&self, clock: &dyn Clock, token: &str) -> Result<String, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        // expiry is checked below against the injected clock, without leeway
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(kind = ?e.kind(), "jwt rejected");
            AuthError::InvalidCredentials
        })?;
        let claims = data.claims;

        if clock.now().unix_timestamp() >= claims.exp {
            debug!(sub = %claims.sub, exp = claims.exp, "jwt expired");
            return Err(AuthError::InvalidCredentials);
        }
        if claims.sub.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        debug!(sub = %claims.sub, "jwt verified");
        Ok(claims.sub)
    }
}
