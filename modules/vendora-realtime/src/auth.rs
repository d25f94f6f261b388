use anyhow::Result;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vendora_common::{Identity, Role};

const TOKEN_DURATION_SECS: i64 = 24 * 3600; // 24 hours
const COOKIE_NAME: &str = "vendora_token";

/// JWT claims carried by the bearer token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

/// JWT service for creating and verifying tokens. Shared by the REST layer
/// and the realtime channel so one credential authenticates both.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    pub fn create_token(&self, identity: &Identity) -> Result<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: identity.user_id.to_string(),
            role: identity.role,
            exp: now.timestamp() + TOKEN_DURATION_SECS,
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify a token and resolve the identity it carries.
    pub fn verify_token(&self, token: &str) -> Result<Identity> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)?.claims;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| anyhow::anyhow!("token subject is not a valid user id"))?;

        Ok(Identity {
            user_id,
            role: claims.role,
        })
    }
}

/// Extract a bearer token from a request. Precedence: `Authorization`
/// header, then `token` query parameter, then session cookie.
pub fn extract_token(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    if let Some(header) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = extract_bearer_token(header) {
            return Some(token.to_string());
        }
    }

    if let Some(token) = query_token {
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    headers
        .get(axum::http::header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|header| parse_cookie(header, COOKIE_NAME))
        .map(|token| token.to_string())
}

fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}

/// Parse a specific cookie from the Cookie header string.
fn parse_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix(name) {
            if let Some(value) = value.strip_prefix('=') {
                return Some(value);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{AUTHORIZATION, COOKIE};

    fn test_service() -> JwtService {
        JwtService::new("test-secret-key", "vendora".to_string())
    }

    fn identity() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            role: Role::VendorAdmin,
        }
    }

    #[test]
    fn roundtrip_token() {
        let svc = test_service();
        let id = identity();
        let token = svc.create_token(&id).unwrap();
        let verified = svc.verify_token(&token).unwrap();
        assert_eq!(verified, id);
    }

    #[test]
    fn rejects_invalid_token() {
        assert!(test_service().verify_token("garbage").is_err());
    }

    #[test]
    fn rejects_wrong_secret() {
        let svc1 = JwtService::new("secret-a", "vendora".to_string());
        let svc2 = JwtService::new("secret-b", "vendora".to_string());
        let token = svc1.create_token(&identity()).unwrap();
        assert!(svc2.verify_token(&token).is_err());
    }

    #[test]
    fn rejects_wrong_issuer() {
        let svc1 = JwtService::new("secret", "vendora".to_string());
        let svc2 = JwtService::new("secret", "other".to_string());
        let token = svc1.create_token(&identity()).unwrap();
        assert!(svc2.verify_token(&token).is_err());
    }

    #[test]
    fn bearer_prefix_parsing() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer xyz789"), Some("xyz789"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("abc123"), None);
    }

    #[test]
    fn header_wins_over_query_and_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer from-header".parse().unwrap());
        headers.insert(COOKIE, "vendora_token=from-cookie".parse().unwrap());
        assert_eq!(
            extract_token(&headers, Some("from-query")),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn query_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "vendora_token=from-cookie".parse().unwrap());
        assert_eq!(
            extract_token(&headers, Some("from-query")),
            Some("from-query".to_string())
        );
    }

    #[test]
    fn cookie_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "other=x; vendora_token=from-cookie".parse().unwrap());
        assert_eq!(
            extract_token(&headers, None),
            Some("from-cookie".to_string())
        );
    }

    #[test]
    fn no_credentials_means_none() {
        assert_eq!(extract_token(&HeaderMap::new(), None), None);
    }
}
