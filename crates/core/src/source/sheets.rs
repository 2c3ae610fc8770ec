//! Google Sheets export source (secondary).
//!
//! Reads a fixed A1 range with a service account. When the spreadsheet id or
//! the credential is missing the source is a no-op that yields no tickets.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::SheetsConfig;
use crate::ticket::NormalizedTicket;

use super::sheet_row::parse_sheet_rows;
use super::{truncate_body, SourceError, TicketSource};

const SHEETS_SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets.readonly"];

/// Supplies bearer tokens for the Sheets API.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, SourceError>;
}

/// OAuth2 tokens minted from a service account key.
pub struct ServiceAccountToken {
    account: CustomServiceAccount,
}

impl ServiceAccountToken {
    /// Parse a service account key given as raw JSON or base64-encoded JSON.
    ///
    /// A key that is present but unusable is a [`SourceError::AuthError`].
    pub fn from_key(key: &str) -> Result<Self, SourceError> {
        let key = key.trim();
        let json = if key.starts_with('{') {
            key.to_string()
        } else {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(key)
                .map_err(|e| {
                    SourceError::AuthError(format!("Service account is not valid base64: {}", e))
                })?;
            String::from_utf8(bytes).map_err(|e| {
                SourceError::AuthError(format!("Service account is not UTF-8: {}", e))
            })?
        };

        let account = CustomServiceAccount::from_json(&json).map_err(|e| {
            SourceError::AuthError(format!("Invalid service account key: {}", e))
        })?;

        Ok(Self { account })
    }
}

#[async_trait]
impl AccessTokenProvider for ServiceAccountToken {
    async fn access_token(&self) -> Result<String, SourceError> {
        let token = self
            .account
            .token(SHEETS_SCOPES)
            .await
            .map_err(|e| SourceError::AuthError(format!("Failed to get Sheets token: {}", e)))?;
        Ok(token.as_str().to_string())
    }
}

/// A fixed, pre-issued bearer token.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, SourceError> {
        Ok(self.0.clone())
    }
}

/// Google Sheets client producing secondary tickets.
pub struct SheetsSource {
    client: Client,
    config: SheetsConfig,
    auth: Option<Arc<dyn AccessTokenProvider>>,
}

impl SheetsSource {
    /// Create a source from configuration.
    ///
    /// An incomplete configuration yields a disabled source; an unusable
    /// credential is an error.
    pub fn new(config: SheetsConfig) -> Result<Self, SourceError> {
        let auth: Option<Arc<dyn AccessTokenProvider>> = if config.is_enabled() {
            let key = config.service_account.as_deref().unwrap_or_default();
            Some(Arc::new(ServiceAccountToken::from_key(key)?))
        } else {
            None
        };

        Self::build(config, auth)
    }

    /// Create a source with an explicit token provider.
    pub fn with_token_provider(
        config: SheetsConfig,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, SourceError> {
        Self::build(config, Some(auth))
    }

    fn build(
        config: SheetsConfig,
        auth: Option<Arc<dyn AccessTokenProvider>>,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            config,
            auth,
        })
    }

    /// Build the values URL for the configured range.
    fn values_url(&self, spreadsheet_id: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(&self.config.range)
        )
    }

    async fn fetch_rows(
        &self,
        auth: &dyn AccessTokenProvider,
        spreadsheet_id: &str,
    ) -> Result<Vec<Vec<String>>, SourceError> {
        let token = auth.access_token().await?;
        let url = self.values_url(spreadsheet_id);

        debug!(range = %self.config.range, "Fetching spreadsheet values");

        let response = self.client.get(&url).bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        let range: ValueRange = response.json().await.map_err(|e| {
            SourceError::ParseError(format!("Failed to parse values response: {}", e))
        })?;

        Ok(range
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

#[async_trait]
impl TicketSource for SheetsSource {
    fn name(&self) -> &str {
        "sheets"
    }

    fn is_configured(&self) -> bool {
        self.auth.is_some()
            && self
                .config
                .spreadsheet_id
                .as_deref()
                .is_some_and(|id| !id.trim().is_empty())
    }

    async fn fetch_tickets(&self) -> Result<Vec<NormalizedTicket>, SourceError> {
        let (Some(auth), Some(spreadsheet_id)) = (&self.auth, self.config.spreadsheet_id.as_deref())
        else {
            info!("Google Sheets not configured, skipping");
            return Ok(Vec::new());
        };
        if spreadsheet_id.trim().is_empty() {
            info!("Google Sheets not configured, skipping");
            return Ok(Vec::new());
        }

        let rows = self.fetch_rows(auth.as_ref(), spreadsheet_id.trim()).await?;
        let tickets = parse_sheet_rows(&rows);

        info!(
            rows = rows.len(),
            tickets = tickets.len(),
            "Fetched tickets from Google Sheets"
        );

        Ok(tickets)
    }
}

/// Render a cell as text. Formatted values are strings already; other JSON
/// types appear with non-default render options.
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ============================================================================
// Sheets API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<serde_json::Value>>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enabled_config() -> SheetsConfig {
        SheetsConfig {
            spreadsheet_id: Some("sheet-123".to_string()),
            service_account: None,
            base_url: "http://localhost:9999/v4/".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_values_url_encodes_range() {
        let source =
            SheetsSource::with_token_provider(enabled_config(), Arc::new(StaticToken("t".into())))
                .unwrap();
        assert_eq!(
            source.values_url("sheet-123"),
            "http://localhost:9999/v4/spreadsheets/sheet-123/values/Tickets%21A%3AL"
        );
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(json!("Attending")), "Attending");
        assert_eq!(cell_text(json!(42)), "42");
        assert_eq!(cell_text(json!(null)), "");
        assert_eq!(cell_text(json!(true)), "true");
    }

    #[test]
    fn test_invalid_service_account_is_rejected() {
        let config = SheetsConfig {
            spreadsheet_id: Some("sheet".to_string()),
            service_account: Some("%%% not base64 %%%".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            SheetsSource::new(config),
            Err(SourceError::AuthError(_))
        ));

        let config = SheetsConfig {
            spreadsheet_id: Some("sheet".to_string()),
            service_account: Some("{\"type\": \"service_account\"}".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            SheetsSource::new(config),
            Err(SourceError::AuthError(_))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_source_yields_nothing() {
        let source = SheetsSource::new(SheetsConfig::default()).unwrap();
        assert!(!source.is_configured());
        let tickets = source.fetch_tickets().await.unwrap();
        assert!(tickets.is_empty());
    }

    #[tokio::test]
    async fn test_missing_spreadsheet_id_yields_nothing() {
        let config = SheetsConfig {
            spreadsheet_id: None,
            ..Default::default()
        };
        let source =
            SheetsSource::with_token_provider(config, Arc::new(StaticToken("t".into()))).unwrap();
        assert!(!source.is_configured());
        assert!(source.fetch_tickets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_static_token() {
        let token = StaticToken("abc".to_string());
        assert_eq!(token.access_token().await.unwrap(), "abc");
    }
}
