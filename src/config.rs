use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RunError;
use crate::source::rapidapi::DEFAULT_RAPIDAPI_HOST;
use crate::trends::Thresholds;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_HISTORY_PATH: &str = "engagement_history.json";
pub const DEFAULT_LEDGER_PATH: &str = "alerted_posts.json";

/// Monitoring settings from the JSON config file.
///
/// Every field has a default, so a partial file (or no file at all) works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub keywords: Vec<String>,
    pub followed_accounts: Vec<String>,
    /// Engagement gained per hour that counts as rapid growth
    pub rapid_growth_threshold: f64,
    /// Total engagement that triggers an alert on its own
    pub absolute_threshold: u64,
    /// How often the external scheduler runs us. Informational only.
    pub check_interval_minutes: u32,
    pub max_results_per_query: usize,
    /// Snapshots not refreshed for this long are dropped
    pub history_retention_hours: u32,
    /// Ledger entries older than this are forgotten. Matches the source's
    /// 7-day recency window so a forgotten post can't be fetched again.
    pub ledger_retention_days: u32,
    pub request_timeout_secs: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            keywords: vec![
                "AI".to_string(),
                "GPT".to_string(),
                "LLM".to_string(),
                "data analytics".to_string(),
            ],
            followed_accounts: Vec::new(),
            rapid_growth_threshold: 1000.0,
            absolute_threshold: 5000,
            check_interval_minutes: 15,
            max_results_per_query: 100,
            history_retention_hours: 48,
            ledger_retention_days: 7,
            request_timeout_secs: 30,
        }
    }
}

impl MonitorSettings {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, RunError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .map_err(|e| RunError::config(format!("cannot read {}: {e}", path.display())))?;
        let settings: Self = serde_json::from_str(&raw)
            .map_err(|e| RunError::config(format!("invalid {}: {e}", path.display())))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the detector can't work with.
    pub fn validate(&self) -> Result<(), RunError> {
        if !(self.rapid_growth_threshold.is_finite() && self.rapid_growth_threshold > 0.0) {
            return Err(RunError::config(format!(
                "rapid_growth_threshold must be a positive number, got {}",
                self.rapid_growth_threshold
            )));
        }
        if self.absolute_threshold == 0 {
            return Err(RunError::config("absolute_threshold must be greater than 0"));
        }
        if self.keywords.is_empty() && self.followed_accounts.is_empty() {
            return Err(RunError::config(
                "nothing to monitor: set keywords and/or followed_accounts",
            ));
        }
        if self.max_results_per_query == 0 {
            return Err(RunError::config("max_results_per_query must be greater than 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(RunError::config("request_timeout_secs must be greater than 0"));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            rapid_growth_per_hour: self.rapid_growth_threshold,
            absolute_total: self.absolute_threshold,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Which post source to use, with its credentials.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceBackend {
    /// Official X API v2 — TWITTER_BEARER_TOKEN
    Official { bearer_token: String },
    /// RapidAPI twitter-api45 proxy — RAPIDAPI_KEY (+ RAPIDAPI_HOST)
    RapidApi { api_key: String, api_host: String },
}

/// Which email transport to use, with its credentials.
#[derive(Debug, Clone, PartialEq)]
pub enum MailBackend {
    /// SENDGRID_API_KEY + SENDGRID_FROM_EMAIL
    SendGrid { api_key: String, from: String },
    /// SMTP_USER + SMTP_PASSWORD (+ SMTP_HOST, SMTP_PORT, SMTP_FROM)
    Smtp {
        host: String,
        port: u16,
        username: String,
        password: String,
        from: String,
    },
}

/// Central configuration: file settings plus environment credentials.
///
/// All secrets come from env vars (never the config file). The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: MonitorSettings,
    pub source: Option<SourceBackend>,
    pub mail: Option<MailBackend>,
    /// Recipient for alert emails (NOTIFY_EMAIL, overridable with --email)
    pub notify_email: Option<String>,
    pub history_path: PathBuf,
    pub ledger_path: PathBuf,
}

impl Config {
    /// Load the config file at `config_path` and credentials from the
    /// process environment.
    pub fn load(config_path: &Path) -> Result<Self, RunError> {
        let settings = MonitorSettings::load(config_path)?;
        Self::from_lookup(settings, |key| env::var(key).ok())
    }

    /// Build a config from `settings` and an environment lookup function.
    ///
    /// Empty variables count as unset. Backend selection: the official API
    /// wins over RapidAPI, SendGrid wins over SMTP.
    pub fn from_lookup<F>(settings: MonitorSettings, lookup: F) -> Result<Self, RunError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let source = if let Some(bearer_token) = var("TWITTER_BEARER_TOKEN") {
            Some(SourceBackend::Official { bearer_token })
        } else {
            var("RAPIDAPI_KEY").map(|api_key| SourceBackend::RapidApi {
                api_key,
                api_host: var("RAPIDAPI_HOST")
                    .unwrap_or_else(|| DEFAULT_RAPIDAPI_HOST.to_string()),
            })
        };

        let mail = match (var("SENDGRID_API_KEY"), var("SENDGRID_FROM_EMAIL")) {
            (Some(api_key), Some(from)) => Some(MailBackend::SendGrid { api_key, from }),
            (Some(_), None) => {
                return Err(RunError::config(
                    "SENDGRID_API_KEY is set but SENDGRID_FROM_EMAIL (a verified sender) is not",
                ));
            }
            _ => match (var("SMTP_USER"), var("SMTP_PASSWORD")) {
                (Some(username), Some(password)) => {
                    let port = match var("SMTP_PORT") {
                        Some(p) => p.trim().parse::<u16>().map_err(|_| {
                            RunError::config(format!("SMTP_PORT is not a valid port: {p}"))
                        })?,
                        None => 587,
                    };
                    Some(MailBackend::Smtp {
                        host: var("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                        port,
                        from: var("SMTP_FROM").unwrap_or_else(|| username.clone()),
                        username,
                        password,
                    })
                }
                _ => None,
            },
        };

        Ok(Self {
            settings,
            source,
            mail,
            notify_email: var("NOTIFY_EMAIL"),
            history_path: var("TRENDWATCH_HISTORY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_PATH)),
            ledger_path: var("TRENDWATCH_LEDGER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH)),
        })
    }

    /// Check that post source credentials are configured.
    /// Call this before any operation that fetches posts.
    pub fn require_source(&self) -> Result<&SourceBackend, RunError> {
        self.source.as_ref().ok_or_else(|| {
            RunError::config(
                "No X API credentials found. Set either:\n  \
                 - TWITTER_BEARER_TOKEN for the official API\n  \
                 - RAPIDAPI_KEY (and optionally RAPIDAPI_HOST) for the RapidAPI proxy",
            )
        })
    }

    /// Check that email credentials are configured.
    pub fn require_mail(&self) -> Result<&MailBackend, RunError> {
        self.mail.as_ref().ok_or_else(|| {
            RunError::config(
                "No email credentials found. Set one of:\n  \
                 - SENDGRID_API_KEY + SENDGRID_FROM_EMAIL\n  \
                 - SMTP_USER + SMTP_PASSWORD (and optionally SMTP_HOST, SMTP_PORT, SMTP_FROM)",
            )
        })
    }

    /// Check that there is someone to send alerts to.
    pub fn require_recipient(&self) -> Result<&str, RunError> {
        self.notify_email.as_deref().ok_or_else(|| {
            RunError::config("No alert recipient. Set NOTIFY_EMAIL or pass --email.")
        })
    }
}
