use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
pub const DEFAULT_SERVICE_ACCOUNT_PATH: &str = "config/serviceAccountKey.json";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccount {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("parsing service account JSON")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Critical error: service account file not found at {}", path.display());
        }
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("in {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub enum Credentials {
    ServiceAccount(ServiceAccount),
    AccessToken(String),
}

/// Firestore credentials and target project, resolved before any network traffic.
#[derive(Debug, Clone)]
pub struct FirestoreSettings {
    pub project_id: String,
    pub credentials: Credentials,
}

impl FirestoreSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_override = lookup("FIRESTORE_PROJECT_ID").filter(|p| !p.trim().is_empty());

        if let Some(token) = lookup("FIRESTORE_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()) {
            let project_id = project_override
                .ok_or_else(|| anyhow!("FIRESTORE_PROJECT_ID is required with FIRESTORE_ACCESS_TOKEN"))?;
            info!("Firestore credentials - source=FIRESTORE_ACCESS_TOKEN, project={}", project_id);
            return Ok(Self {
                project_id,
                credentials: Credentials::AccessToken(token.trim().to_string()),
            });
        }

        let account = if let Some(raw) = lookup("FIREBASE_SERVICE_ACCOUNT").filter(|r| !r.trim().is_empty()) {
            let account = ServiceAccount::from_json(&raw).context("FIREBASE_SERVICE_ACCOUNT")?;
            info!("Firestore credentials - source=FIREBASE_SERVICE_ACCOUNT");
            account
        } else {
            let path = lookup("FIREBASE_SERVICE_ACCOUNT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SERVICE_ACCOUNT_PATH));
            let account = ServiceAccount::from_file(&path)?;
            info!("Firestore credentials - source=file, path={}", path.display());
            account
        };

        Ok(Self {
            project_id: project_override.unwrap_or_else(|| account.project_id.clone()),
            credentials: Credentials::ServiceAccount(account),
        })
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}

struct CachedToken {
    value: String,
    refresh_at: chrono::DateTime<Utc>,
}

/// Hands out bearer tokens for Firestore, minting a new one shortly before the old expires.
pub struct TokenProvider {
    client: Client,
    credentials: Credentials,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(client: Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
            cached: Mutex::new(None),
        }
    }

    pub async fn token(&self) -> Result<String> {
        let account = match &self.credentials {
            Credentials::AccessToken(t) => return Ok(t.clone()),
            Credentials::ServiceAccount(a) => a,
        };

        let mut cached = self.cached.lock().await;
        if let Some(tok) = cached.as_ref() {
            if Utc::now() < tok.refresh_at {
                return Ok(tok.value.clone());
            }
        }

        let fresh = self.mint(account).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn mint(&self, account: &ServiceAccount) -> Result<CachedToken> {
        let now = Utc::now();
        let claims = Claims {
            iss: &account.client_email,
            scope: DATASTORE_SCOPE,
            aud: &account.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .context("EncodingKey::from_rsa_pem (is private_key an RSA key?)")?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &key).context("encode JWT")?;

        let resp = self
            .client
            .post(&account.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .context("token request failed")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("token endpoint returned {}: {}", status, text);
        }
        let tr: TokenResponse = resp.json().await.context("decoding token response")?;
        let lifetime = if tr.expires_in > 0 { tr.expires_in } else { 3600 };
        debug!("Access token minted - expires_in={}s", lifetime);

        Ok(CachedToken {
            value: tr.access_token,
            refresh_at: now + Duration::seconds((lifetime - 60).max(0)),
        })
    }
}
