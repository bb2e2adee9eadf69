// src/gsc/auth.rs
// =============================================================================
// This module logs in to Google with a service-account key file.
//
// How the login works (OAuth 2.0 "JWT bearer" flow):
// 1. Read the JSON key file downloaded from the Google Cloud console
// 2. Build a small signed token (a JWT) saying "I am <client_email> and I
//    want the webmasters.readonly scope"
// 3. Sign it with the private key from the file (RS256)
// 4. POST it to the key's token_uri and get an access token back
//
// The access token is then used as a bearer token by SearchConsoleClient.
//
// Rust concepts:
// - serde: Reading the key file and the token response straight into structs
// - Result + ?: Every step can fail, and all failures become AuditError::Auth
// =============================================================================

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AuditError, Result};

// Read-only access to Search Console data is all we need
pub const WEBMASTERS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/webmasters.readonly";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

// Google accepts assertions that live at most one hour
const ASSERTION_LIFETIME_SECS: i64 = 3600;

// The parts of a service-account key file we use
//
// A real key file has more fields (project_id, client_id, ...), serde just
// ignores the ones we don't list here.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    // Loads a key file from disk
    //
    // Returns: AuditError::Auth if the file is missing or isn't a key file,
    // since either way we can't log in
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AuditError::Auth(format!("could not read credentials {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            AuditError::Auth(format!(
                "{} is not a service account key file: {}",
                path.display(),
                e
            ))
        })
    }
}

// The claims inside the signed assertion
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

// What the token endpoint sends back on success
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

// Exchanges a service-account key for an access token
//
// Parameters:
//   key: the loaded key file
//   timeout: HTTP timeout for the token request
//
// Returns: the access token string, ready for SearchConsoleClient::new
pub async fn request_access_token(key: &ServiceAccountKey, timeout: Duration) -> Result<String> {
    let assertion = sign_assertion(key)?;

    let client = Client::builder()
        .user_agent(concat!("sitemap-audit/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?;

    debug!("Requesting access token from {}", key.token_uri);

    // The token endpoint wants a regular HTML-form body, not JSON
    let response = client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuditError::Auth(format!(
            "token request for {} returned HTTP {}: {}",
            key.client_email,
            status.as_u16(),
            body.trim()
        )));
    }

    let token: TokenResponse = response.json().await?;
    info!(
        account = %key.client_email,
        expires_in = token.expires_in.unwrap_or_default(),
        "Logged in with service account"
    );

    Ok(token.access_token)
}

// Builds and signs the JWT that proves who we are
fn sign_assertion(key: &ServiceAccountKey) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        iss: key.client_email.clone(),
        scope: WEBMASTERS_READONLY_SCOPE.to_string(),
        aud: key.token_uri.clone(),
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };

    // kid tells Google which of the account's keys signed this
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| AuditError::Auth(format!("invalid private key: {}", e)))?;

    encode(&header, &claims, &signing_key)
        .map_err(|e| AuditError::Auth(format!("could not sign token request: {}", e)))
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is a JWT?
//    - Three base64 chunks joined by dots: header.claims.signature
//    - Anyone can read the claims, but only the private key holder can sign
//    - Google checks the signature with the public half of the key
//
// 2. Why #[serde(default = "default_token_uri")]?
//    - Older key files may not include token_uri
//    - serde calls the named function when the field is missing
//
// 3. Why .form() instead of .json()?
//    - OAuth token endpoints expect application/x-www-form-urlencoded
//    - reqwest encodes the (name, value) pairs for us
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};
    use serde_json::json;
    use wiremock::{
        matchers::{body_string_contains, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    const PRIVATE_KEY: &str = include_str!("testdata/test_key.pem");
    const PUBLIC_KEY: &str = include_str!("testdata/test_key.pub.pem");

    fn key_for(token_uri: String) -> ServiceAccountKey {
        ServiceAccountKey {
            client_email: "auditor@example-project.iam.gserviceaccount.com".to_string(),
            private_key: PRIVATE_KEY.to_string(),
            private_key_id: Some("key-1".to_string()),
            token_uri,
        }
    }

    #[tokio::test]
    async fn test_exchanges_signed_assertion_for_token() {
        let server = MockServer::start().await;
        let token_uri = format!("{}/token", server.uri());

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains(
                "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.service-token",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = request_access_token(&key_for(token_uri.clone()), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(token, "ya29.service-token");

        // Check the assertion we sent is signed by our key and asks for the right scope
        let requests = server.received_requests().await.unwrap();
        let assertion = url::form_urlencoded::parse(&requests[0].body)
            .find(|(name, _)| name == "assertion")
            .map(|(_, value)| value.into_owned())
            .unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[token_uri.as_str()]);
        let decoded = decode::<Claims>(
            &assertion,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.header.kid.as_deref(), Some("key-1"));
        assert_eq!(decoded.claims.iss, "auditor@example-project.iam.gserviceaccount.com");
        assert_eq!(decoded.claims.scope, WEBMASTERS_READONLY_SCOPE);
        assert_eq!(decoded.claims.exp - decoded.claims.iat, ASSERTION_LIFETIME_SECS);
    }

    #[tokio::test]
    async fn test_rejected_token_request_is_an_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid JWT Signature."
            })))
            .mount(&server)
            .await;

        let result =
            request_access_token(&key_for(format!("{}/token", server.uri())), Duration::from_secs(5))
                .await;
        match result {
            Err(AuditError::Auth(message)) => assert!(message.contains("invalid_grant")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_private_key_is_an_auth_error() {
        let mut key = key_for(DEFAULT_TOKEN_URI.to_string());
        key.private_key = "not a pem".to_string();
        assert!(matches!(sign_assertion(&key), Err(AuditError::Auth(_))));
    }

    #[test]
    fn test_load_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("service-account.json");
        let contents = json!({
            "type": "service_account",
            "project_id": "example-project",
            "private_key_id": "abc123",
            "private_key": PRIVATE_KEY,
            "client_email": "auditor@example-project.iam.gserviceaccount.com",
            "client_id": "1234567890"
        });
        fs::write(&key_path, contents.to_string()).unwrap();

        let key = ServiceAccountKey::from_file(&key_path).unwrap();
        assert_eq!(key.client_email, "auditor@example-project.iam.gserviceaccount.com");
        assert_eq!(key.private_key_id.as_deref(), Some("abc123"));
        // token_uri is missing from the file, so the Google default is used
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_missing_key_file_is_an_auth_error() {
        let result = ServiceAccountKey::from_file(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(AuditError::Auth(_))));
    }
}
