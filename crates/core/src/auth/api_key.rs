use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Shared-key authenticator.
///
/// Reads the key from `Authorization: Bearer <key>` first, then `X-API-Key`.
pub struct ApiKeyAuthenticator {
    expected_key: String,
}

impl ApiKeyAuthenticator {
    pub fn new(api_key: String) -> Self {
        Self {
            expected_key: api_key,
        }
    }

    fn provided_key<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        let bearer = request.headers.get("authorization").and_then(|value| {
            let (scheme, key) = value.split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then_some(key.trim())
        });

        bearer.or_else(|| request.headers.get("x-api-key").map(String::as_str))
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let key = self
            .provided_key(request)
            .ok_or(AuthError::NotAuthenticated)?;

        if !constant_time_eq(key.as_bytes(), self.expected_key.as_bytes()) {
            return Err(AuthError::InvalidCredentials("Invalid API key".to_string()));
        }

        Ok(Identity {
            principal: "api_key_client".to_string(),
            method: self.method_name().to_string(),
        })
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

/// Length-leaking but content-constant comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(headers: &[(&str, &str)]) -> AuthRequest {
        AuthRequest {
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.to_string()))
                .collect(),
            source_ip: "127.0.0.1".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_bearer_token_valid() {
        let auth = ApiKeyAuthenticator::new("pika-123".to_string());
        let identity = auth
            .authenticate(&request(&[("Authorization", "Bearer pika-123")]))
            .await
            .unwrap();
        assert_eq!(identity.principal, "api_key_client");
        assert_eq!(identity.method, "api_key");
    }

    #[tokio::test]
    async fn test_bearer_scheme_is_case_insensitive() {
        let auth = ApiKeyAuthenticator::new("pika-123".to_string());
        let result = auth
            .authenticate(&request(&[("Authorization", "bearer pika-123")]))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_x_api_key_header_valid() {
        let auth = ApiKeyAuthenticator::new("pika-123".to_string());
        let result = auth.authenticate(&request(&[("X-API-Key", "pika-123")])).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let auth = ApiKeyAuthenticator::new("pika-123".to_string());
        let result = auth
            .authenticate(&request(&[("Authorization", "Bearer raichu")]))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn test_missing_header() {
        let auth = ApiKeyAuthenticator::new("pika-123".to_string());
        let result = auth.authenticate(&request(&[])).await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
        assert!(constant_time_eq(b"", b""));
    }
}
