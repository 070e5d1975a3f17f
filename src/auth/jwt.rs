use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{config::JwtConfig, error::ApiError, state::AppState};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
    pub aud: String,
}

/// Signing and verification keys plus the issuance parameters, built once per
/// request from the read-only config.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_days.max(0) as u64) * 24 * 60 * 60),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.as_secs() as i64
    }

    pub fn sign(&self, user_id: i64) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::new(&state.config.jwt)
    }
}

/// Extractor for protected routes: resolves the acting user from the bearer
/// token alone. The wrapped id is the only owner-scoping key handlers may use.
#[derive(Debug)]
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthenticated("missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthenticated("invalid Authorization header"))?;

        match keys.verify(token) {
            Ok(claims) => Ok(AuthUser(claims.sub)),
            Err(_) => {
                warn!("invalid or expired token");
                Err(ApiError::Unauthenticated("invalid or expired token"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;

    fn make_keys() -> JwtKeys {
        JwtKeys::new(&JwtConfig::for_tests())
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let token = keys.sign(42).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn ttl_matches_config() {
        let keys = make_keys();
        assert_eq!(keys.ttl_seconds(), 30 * 24 * 60 * 60);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let keys = make_keys();
        let other = JwtKeys::new(&JwtConfig {
            secret: "a-different-secret".into(),
            ..JwtConfig::for_tests()
        });
        let token = other.sign(7).expect("sign");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_issuer_and_audience() {
        let keys = make_keys();
        let other = JwtKeys::new(&JwtConfig {
            issuer: "someone-else".into(),
            audience: "their-users".into(),
            ..JwtConfig::for_tests()
        });
        let token = other.sign(7).expect("sign");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys();
        let issued = OffsetDateTime::now_utc() - TimeDuration::days(31);
        let claims = Claims {
            sub: 9,
            iat: issued.unix_timestamp() as usize,
            exp: (issued + TimeDuration::days(1)).unix_timestamp() as usize,
            iss: "test-issuer".into(),
            aud: "test-aud".into(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys();
        assert!(keys.verify("not.a.jwt").is_err());
        assert!(keys.verify("").is_err());
    }

    async fn extract(keys: &JwtKeys, header: Option<&str>) -> Result<AuthUser, ApiError> {
        let mut builder = axum::http::Request::builder();
        if let Some(value) = header {
            builder = builder.header(axum::http::header::AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).expect("request builds").into_parts();
        AuthUser::from_request_parts(&mut parts, keys).await
    }

    #[tokio::test]
    async fn extractor_accepts_bearer_token() {
        let keys = make_keys();
        let token = keys.sign(42).expect("sign");
        let AuthUser(user_id) = extract(&keys, Some(&format!("Bearer {token}")))
            .await
            .expect("extracts");
        assert_eq!(user_id, 42);
    }

    #[tokio::test]
    async fn extractor_rejects_missing_header() {
        let keys = make_keys();
        let err = extract(&keys, None).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Unauthenticated("missing Authorization header")
        ));
    }

    #[tokio::test]
    async fn extractor_rejects_non_bearer_scheme() {
        let keys = make_keys();
        let err = extract(&keys, Some("Basic YWxpY2U6aHVudGVyMg=="))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Unauthenticated("invalid Authorization header")
        ));
    }

    #[tokio::test]
    async fn extractor_rejects_tampered_token() {
        let keys = make_keys();
        let mut token = keys.sign(42).expect("sign");
        token.pop();
        let err = extract(&keys, Some(&format!("Bearer {token}"))).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Unauthenticated("invalid or expired token")
        ));
    }

    #[tokio::test]
    async fn extractor_rejects_foreign_secret() {
        let keys = make_keys();
        let other = JwtKeys::new(&JwtConfig {
            secret: "a-different-secret".into(),
            ..JwtConfig::for_tests()
        });
        let token = other.sign(42).expect("sign");
        let err = extract(&keys, Some(&format!("Bearer {token}"))).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Unauthenticated("invalid or expired token")
        ));
    }
}
