use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, SessionUser};
use crate::{config::JwtConfig, state::AppState};

/// Lifetime of every session token.
pub const TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Signing and verification keys derived from the server secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: TOKEN_TTL,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self::from_secret(cfg.secret.as_bytes())
    }

    pub fn issue(&self, user: &SessionUser) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(user, OffsetDateTime::now_utc())
    }

    /// Signs a token as if issued at `now`.
    pub fn issue_at(
        &self,
        user: &SessionUser,
        now: OffsetDateTime,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            user: user.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = user.id, "jwt signed");
        Ok(token)
    }

    /// Checks signature and expiry. A payload that is not a claims object
    /// fails to decode and is rejected like any other bad token.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.user.id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> SessionUser {
        SessionUser {
            id: 7,
            name: "A".into(),
            email: "a@x.com".into(),
            address: Some("Jl. Merdeka 1".into()),
        }
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = JwtKeys::from_secret(b"dev-secret");
        let token = keys.issue(&user()).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.user, user());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_has_three_parts() {
        let keys = JwtKeys::from_secret(b"dev-secret");
        let token = keys.issue(&user()).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn roundtrip_without_address() {
        let keys = JwtKeys::from_secret(b"dev-secret");
        let mut u = user();
        u.address = None;
        let claims = keys.verify(&keys.issue(&u).unwrap()).unwrap();
        assert_eq!(claims.user, u);
    }

    #[test]
    fn issue_is_deterministic_for_fixed_time() {
        let keys = JwtKeys::from_secret(b"dev-secret");
        let now = OffsetDateTime::now_utc();
        let a = keys.issue_at(&user(), now).unwrap();
        let b = keys.issue_at(&user(), now).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::from_secret(b"dev-secret");
        let issued = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let token = keys.issue_at(&user(), issued).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let ours = JwtKeys::from_secret(b"our-secret");
        let theirs = JwtKeys::from_secret(b"their-secret");
        let token = theirs.issue(&user()).unwrap();
        assert!(ours.verify(&token).is_err());
    }

    #[test]
    fn string_payload_is_rejected() {
        let secret = b"dev-secret";
        let keys = JwtKeys::from_secret(secret);
        let token = encode(
            &Header::new(Algorithm::HS256),
            &"just-a-string",
            &EncodingKey::from_secret(secret),
        )
        .unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = JwtKeys::from_secret(b"dev-secret");
        assert!(keys.verify("garbage").is_err());
        assert!(keys.verify("a.b.c").is_err());
    }
}
