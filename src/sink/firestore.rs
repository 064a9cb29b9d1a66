//! Firestore document store over the REST API.
//!
//! Authenticates with a Google service-account key: a signed JWT assertion
//! is exchanged for an OAuth access token once at startup, and the token is
//! refreshed shortly before it expires. Each insert is one `POST` to the
//! collection's documents endpoint with the document id chosen by the caller,
//! so a repeated insert answers `409` instead of creating a second document.

use crate::capture::Document;
use crate::error::{SinkError, StartupError};
use crate::sink::DocumentStore;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;

/// Default Firestore REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com";

/// OAuth scope granting Firestore access.
const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Refresh the access token this long before it expires.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Lifetime requested for each signed assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

// ============================================================================
// Credentials
// ============================================================================

/// Fields read from a service-account key file.
#[derive(Deserialize)]
struct ServiceAccountFile {
    project_id: String,
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

/// A parsed, ready-to-sign service account.
#[derive(Clone)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    pub token_uri: String,
    signing_key: EncodingKey,
}

impl ServiceAccount {
    /// Loads and validates a service-account key file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StartupError> {
        let path = path.as_ref();
        let credentials_error = |reason: String| StartupError::Credentials {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| credentials_error(e.to_string()))?;
        Self::from_json(&content).map_err(credentials_error)
    }

    /// Parses a service-account key from its JSON text.
    pub fn from_json(content: &str) -> Result<Self, String> {
        let file: ServiceAccountFile =
            serde_json::from_str(content).map_err(|e| format!("not a service-account key: {}", e))?;

        if file.project_id.trim().is_empty() {
            return Err("project_id is empty".to_string());
        }

        let signing_key = EncodingKey::from_rsa_pem(file.private_key.as_bytes())
            .map_err(|e| format!("invalid private_key: {}", e))?;

        Ok(Self {
            project_id: file.project_id,
            client_email: file.client_email,
            token_uri: file.token_uri,
            signing_key,
        })
    }

    /// Builds the signed JWT bearer assertion for the token exchange.
    fn assertion(&self, now: DateTime<Utc>) -> Result<String, SinkError> {
        let claims = Claims {
            iss: &self.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| SinkError::Auth(format!("failed to sign assertion: {}", e)))
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

// ============================================================================
// Store
// ============================================================================

/// Connection settings for [`FirestoreStore`].
#[derive(Debug, Clone)]
pub struct FirestoreOptions {
    /// Base URL of the REST API.
    pub endpoint: String,
    /// Timeout applied to every HTTP request.
    pub timeout: Duration,
}

impl Default for FirestoreOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Remote document store backed by Cloud Firestore.
pub struct FirestoreStore {
    client: Client,
    account: ServiceAccount,
    endpoint: String,
    token: Option<AccessToken>,
}

impl FirestoreStore {
    /// Builds the HTTP client and authenticates once.
    ///
    /// Fails with a [`StartupError`] if the token exchange is rejected, so a
    /// listener never starts against a store it cannot write to.
    pub fn connect(account: ServiceAccount, options: FirestoreOptions) -> Result<Self, StartupError> {
        let client = Client::builder().timeout(options.timeout).build()?;

        let mut store = Self {
            client,
            account,
            endpoint: options.endpoint.trim_end_matches('/').to_string(),
            token: None,
        };
        store
            .bearer()
            .map_err(|e| StartupError::Auth(e.to_string()))?;

        tracing::info!(
            project = %store.account.project_id,
            account = %store.account.client_email,
            "Authenticated with Firestore"
        );
        Ok(store)
    }

    /// Returns a valid access token, exchanging a new assertion when needed.
    fn bearer(&mut self) -> Result<String, SinkError> {
        let now = Utc::now();
        if let Some(token) = self.token.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let assertion = self.account.assertion(now)?;
        let response = self
            .client
            .post(&self.account.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SinkError::Auth(format!("token exchange returned {}: {}", status, body)));
        }

        let token: TokenResponse = response.json()?;
        tracing::debug!(expires_in = token.expires_in, "Access token refreshed");

        let value = token.access_token.clone();
        self.token = Some(AccessToken {
            value: token.access_token,
            expires_at: now + ChronoDuration::seconds(token.expires_in),
        });
        Ok(value)
    }

    /// URL of the documents endpoint for `collection`.
    pub fn documents_url(&self, collection: &str) -> String {
        documents_url(&self.endpoint, &self.account.project_id, collection)
    }
}

impl DocumentStore for FirestoreStore {
    fn insert(&mut self, collection: &str, id: &str, document: &Document) -> Result<(), SinkError> {
        let token = self.bearer()?;
        let response = self
            .client
            .post(self.documents_url(collection))
            .query(&[("documentId", id)])
            .bearer_auth(token)
            .json(&encode_fields(document))
            .send()?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // Force a fresh token on the next write.
            self.token = None;
        }
        if !status.is_success() {
            return Err(insert_error(status, response.text().unwrap_or_default(), id));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("firestore project {}", self.account.project_id)
    }
}

/// Builds the documents endpoint URL.
pub fn documents_url(endpoint: &str, project_id: &str, collection: &str) -> String {
    format!(
        "{}/v1/projects/{}/databases/(default)/documents/{}",
        endpoint.trim_end_matches('/'),
        project_id,
        collection
    )
}

/// Encodes a document in Firestore's typed-field JSON form.
pub fn encode_fields(document: &Document) -> Value {
    json!({
        "fields": {
            "timestamp": { "stringValue": document.timestamp },
            "event": { "stringValue": document.event },
            "value": { "stringValue": document.value },
        }
    })
}

/// Maps a failed create-document response to a sink error.
fn insert_error(status: StatusCode, body: String, id: &str) -> SinkError {
    match status {
        StatusCode::CONFLICT => SinkError::AlreadyExists(id.to_string()),
        _ => SinkError::Status {
            code: status.as_u16(),
            body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_fields() {
        let doc = Document {
            timestamp: "2024-03-09 14:05:07".to_string(),
            event: "KeyPressed".to_string(),
            value: "a".to_string(),
        };
        let body = encode_fields(&doc);
        assert_eq!(body["fields"]["timestamp"]["stringValue"], "2024-03-09 14:05:07");
        assert_eq!(body["fields"]["event"]["stringValue"], "KeyPressed");
        assert_eq!(body["fields"]["value"]["stringValue"], "a");
    }

    #[test]
    fn test_documents_url() {
        assert_eq!(
            documents_url("https://firestore.googleapis.com/", "demo", "keyboard_events"),
            "https://firestore.googleapis.com/v1/projects/demo/databases/(default)/documents/keyboard_events"
        );
    }

    #[test]
    fn test_insert_errors() {
        let conflict = insert_error(StatusCode::CONFLICT, "ALREADY_EXISTS".to_string(), "abc123");
        assert!(matches!(&conflict, SinkError::AlreadyExists(id) if id == "abc123"));
        assert!(!conflict.is_transient());

        let unavailable = insert_error(StatusCode::SERVICE_UNAVAILABLE, String::new(), "abc123");
        assert!(matches!(unavailable, SinkError::Status { code: 503, .. }));
        assert!(unavailable.is_transient());
    }

    #[test]
    fn test_missing_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");
        match ServiceAccount::load(&path) {
            Err(StartupError::Credentials { path: p, .. }) => assert_eq!(p, path),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("missing file must not load"),
        }
    }

    #[test]
    fn test_invalid_credentials() {
        assert!(ServiceAccount::from_json("{}").is_err());

        let bad_key = json!({
            "project_id": "demo",
            "client_email": "logger@demo.iam.gserviceaccount.com",
            "private_key": "not a pem",
        });
        let err = ServiceAccount::from_json(&bad_key.to_string()).err().unwrap();
        assert!(err.contains("private_key"));

        let no_project = json!({
            "project_id": " ",
            "client_email": "logger@demo.iam.gserviceaccount.com",
            "private_key": "not a pem",
        });
        let err = ServiceAccount::from_json(&no_project.to_string()).err().unwrap();
        assert!(err.contains("project_id"));
    }

    #[test]
    fn test_token_freshness() {
        let now = Utc::now();
        let token = AccessToken {
            value: "t".to_string(),
            expires_at: now + ChronoDuration::seconds(3600),
        };
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + ChronoDuration::seconds(3550)));
    }
}
