use serde::{Deserialize, Deserializer, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub eventbrite: EventbriteConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3001
}

/// Primary ticketing source (Eventbrite) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventbriteConfig {
    /// Private API token. Optional at startup; every ticket request fails
    /// with a configuration error while it is missing.
    #[serde(default)]
    pub token: Option<String>,
    /// Events whose attendees are polled.
    #[serde(
        default = "default_event_ids",
        deserialize_with = "deserialize_event_ids"
    )]
    pub event_ids: Vec<String>,
    /// API base URL (default: https://www.eventbriteapi.com/v3).
    #[serde(default = "default_eventbrite_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Survey question whose answer names the referrer (matched case-insensitively).
    #[serde(default = "default_referral_question")]
    pub referral_question: String,
}

impl Default for EventbriteConfig {
    fn default() -> Self {
        Self {
            token: None,
            event_ids: default_event_ids(),
            base_url: default_eventbrite_url(),
            timeout_secs: default_timeout(),
            referral_question: default_referral_question(),
        }
    }
}

impl EventbriteConfig {
    /// True when a non-blank token is present.
    pub fn token_configured(&self) -> bool {
        self.token
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }
}

fn default_event_ids() -> Vec<String> {
    ["1849540227609", "1859770326109", "1859794378049", "1859807366899"]
        .iter()
        .map(|id| id.to_string())
        .collect()
}

fn default_eventbrite_url() -> String {
    "https://www.eventbriteapi.com/v3".to_string()
}

fn default_referral_question() -> String {
    "which company dancer referred you".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Event ids look numeric, so env overrides and unquoted TOML arrive as integers.
fn deserialize_event_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum EventId {
        Text(String),
        Number(u64),
    }

    let ids = Vec::<EventId>::deserialize(deserializer)?;
    Ok(ids
        .into_iter()
        .map(|id| match id {
            EventId::Text(s) => s.trim().to_string(),
            EventId::Number(n) => n.to_string(),
        })
        .collect())
}

/// Secondary source (Google Sheets export) configuration.
///
/// The source is disabled unless both `spreadsheet_id` and `service_account`
/// are set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    /// Service account key, either raw JSON or base64-encoded JSON.
    #[serde(default)]
    pub service_account: Option<String>,
    /// A1 range to read (default: "Tickets!A:L").
    #[serde(default = "default_range")]
    pub range: String,
    /// API base URL (default: https://sheets.googleapis.com/v4).
    #[serde(default = "default_sheets_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            service_account: None,
            range: default_range(),
            base_url: default_sheets_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl SheetsConfig {
    /// True when both the spreadsheet id and the credential are present.
    pub fn is_enabled(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.spreadsheet_id) && present(&self.service_account)
    }
}

fn default_range() -> String {
    "Tickets!A:L".to_string()
}

fn default_sheets_url() -> String {
    "https://sheets.googleapis.com/v4".to_string()
}

/// Snapshot cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Freshness window in seconds (default: 300)
    #[serde(default = "default_cache_duration")]
    pub duration_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_cache_duration(),
        }
    }
}

fn default_cache_duration() -> u64 {
    300
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub eventbrite: SanitizedEventbriteConfig,
    pub sheets: SanitizedSheetsConfig,
    pub cache: CacheConfig,
}

/// Sanitized Eventbrite config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEventbriteConfig {
    pub token_configured: bool,
    pub event_ids: Vec<String>,
    pub base_url: String,
    pub timeout_secs: u32,
}

/// Sanitized Sheets config (service account hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSheetsConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    pub service_account_configured: bool,
    pub range: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            eventbrite: SanitizedEventbriteConfig {
                token_configured: config.eventbrite.token_configured(),
                event_ids: config.eventbrite.event_ids.clone(),
                base_url: config.eventbrite.base_url.clone(),
                timeout_secs: config.eventbrite.timeout_secs,
            },
            sheets: SanitizedSheetsConfig {
                enabled: config.sheets.is_enabled(),
                spreadsheet_id: config.sheets.spreadsheet_id.clone(),
                service_account_configured: config
                    .sheets
                    .service_account
                    .as_deref()
                    .is_some_and(|s| !s.trim().is_empty()),
                range: config.sheets.range.clone(),
            },
            cache: config.cache.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.eventbrite.event_ids.len(), 4);
        assert!(config.eventbrite.token.is_none());
        assert_eq!(config.sheets.range, "Tickets!A:L");
        assert_eq!(config.cache.duration_secs, 300);
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[eventbrite]
token = "secret"
event_ids = ["111", "222"]
timeout_secs = 10

[sheets]
spreadsheet_id = "sheet-1"
service_account = "e30="
range = "Export!A:L"

[cache]
duration_secs = 60
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.eventbrite.token.as_deref(), Some("secret"));
        assert_eq!(config.eventbrite.event_ids, vec!["111", "222"]);
        assert_eq!(config.eventbrite.timeout_secs, 10);
        assert_eq!(
            config.eventbrite.referral_question,
            "which company dancer referred you"
        );
        assert!(config.sheets.is_enabled());
        assert_eq!(config.sheets.range, "Export!A:L");
        assert_eq!(config.cache.duration_secs, 60);
    }

    #[test]
    fn test_numeric_event_ids_are_accepted() {
        let toml = r#"
[eventbrite]
event_ids = [1849540227609, "1859770326109"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.eventbrite.event_ids,
            vec!["1849540227609", "1859770326109"]
        );
    }

    #[test]
    fn test_blank_token_is_not_configured() {
        let mut config = EventbriteConfig::default();
        assert!(!config.token_configured());
        config.token = Some("   ".to_string());
        assert!(!config.token_configured());
        config.token = Some("abc".to_string());
        assert!(config.token_configured());
    }

    #[test]
    fn test_sheets_requires_id_and_credential() {
        let mut sheets = SheetsConfig {
            spreadsheet_id: Some("sheet".to_string()),
            ..Default::default()
        };
        assert!(!sheets.is_enabled());
        sheets.service_account = Some("{}".to_string());
        assert!(sheets.is_enabled());
        sheets.spreadsheet_id = Some(String::new());
        assert!(!sheets.is_enabled());
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let config = Config {
            eventbrite: EventbriteConfig {
                token: Some("super-secret".to_string()),
                ..Default::default()
            },
            sheets: SheetsConfig {
                spreadsheet_id: Some("sheet-1".to_string()),
                service_account: Some("sa-secret-json".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.eventbrite.token_configured);
        assert!(sanitized.sheets.enabled);
        assert!(sanitized.sheets.service_account_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!json.contains("sa-secret-json"));
    }
}
