//! Layered configuration: built-in defaults, overridden by a config file,
//! overridden by environment variables — the way `sa_domain::config`
//! layers its sections, scaled down to what the core needs.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

// ── Cache ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Override for the cache root directory; `None` means the
    /// platform-appropriate per-user cache dir (§6 Boundary 3).
    #[serde(default)]
    pub root_override: Option<String>,
    #[serde(default = "d_archive_ttl_hours")]
    pub archive_ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root_override: None,
            archive_ttl_hours: d_archive_ttl_hours(),
        }
    }
}

fn d_archive_ttl_hours() -> u64 {
    24
}

// ── Identity resolver ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Handle-resolution endpoints, tried in order (§4.2).
    #[serde(default = "d_resolvers")]
    pub resolvers: Vec<String>,
    /// `did:plc:` directory service base URL.
    #[serde(default = "d_plc_directory")]
    pub plc_directory: String,
    #[serde(default = "d_identity_cache_ttl_hours")]
    pub cache_ttl_hours: u64,
    #[serde(default = "d_identity_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            resolvers: d_resolvers(),
            plc_directory: d_plc_directory(),
            cache_ttl_hours: d_identity_cache_ttl_hours(),
            timeout_secs: d_identity_timeout_secs(),
        }
    }
}

fn d_resolvers() -> Vec<String> {
    vec![
        "https://bsky.social".to_string(),
        "https://public.api.bsky.app".to_string(),
    ]
}

fn d_plc_directory() -> String {
    "https://plc.directory".to_string()
}

fn d_identity_cache_ttl_hours() -> u64 {
    1
}

fn d_identity_timeout_secs() -> u64 {
    10
}

// ── Credential store ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Service name the OS keychain entries are filed under.
    #[serde(default = "d_credentials_service")]
    pub service: String,
    /// Force the file-backed fallback even when a keychain is available
    /// (useful for headless CI).
    #[serde(default)]
    pub force_file_backend: bool,
    /// Override for the fallback credentials file path; `None` means the
    /// platform-appropriate per-user config dir (mirrors
    /// `CacheConfig::root_override`).
    #[serde(default)]
    pub path_override: Option<String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            service: d_credentials_service(),
            force_file_backend: false,
            path_override: None,
        }
    }
}

fn d_credentials_service() -> String {
    "autoreply".to_string()
}

// ── HTTP ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "d_user_agent")]
    pub user_agent: String,
    #[serde(default = "d_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "d_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: d_user_agent(),
            fetch_timeout_secs: d_fetch_timeout_secs(),
            request_timeout_secs: d_request_timeout_secs(),
        }
    }
}

fn d_user_agent() -> String {
    format!("autoreply/{}", env!("CARGO_PKG_VERSION"))
}

fn d_fetch_timeout_secs() -> u64 {
    60
}

fn d_request_timeout_secs() -> u64 {
    120
}

// ── Search ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "d_max_query_len")]
    pub max_query_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_query_len: d_max_query_len(),
        }
    }
}

fn d_max_query_len() -> usize {
    500
}

// ── Validation ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues. An empty
    /// vec means everything looks good.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.identity.resolvers.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "identity.resolvers".into(),
                message: "at least one resolver endpoint is required".into(),
            });
        }
        for (i, resolver) in self.identity.resolvers.iter().enumerate() {
            if !resolver.starts_with("https://") {
                issues.push(ConfigIssue {
                    severity: ConfigSeverity::Warning,
                    field: format!("identity.resolvers[{i}]"),
                    message: format!("resolver \"{resolver}\" is not HTTPS"),
                });
            }
        }
        if !self.identity.plc_directory.starts_with("https://") {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "identity.plc_directory".into(),
                message: "plc_directory is not HTTPS".into(),
            });
        }
        if self.identity.timeout_secs == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "identity.timeout_secs".into(),
                message: "timeout_secs must be greater than 0".into(),
            });
        }
        if self.cache.archive_ttl_hours == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "cache.archive_ttl_hours".into(),
                message: "archive_ttl_hours is 0 — every fetch will skip the cache".into(),
            });
        }
        if self.http.fetch_timeout_secs == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "http.fetch_timeout_secs".into(),
                message: "fetch_timeout_secs must be greater than 0".into(),
            });
        }
        if self.http.request_timeout_secs < self.http.fetch_timeout_secs {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "http.request_timeout_secs".into(),
                message: "request_timeout_secs is shorter than fetch_timeout_secs".into(),
            });
        }
        if self.search.max_query_len == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "search.max_query_len".into(),
                message: "max_query_len must be greater than 0".into(),
            });
        }
        if self.credentials.service.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "credentials.service".into(),
                message: "service must not be empty".into(),
            });
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_errors() {
        let config = Config::default();
        let issues = config.validate();
        assert!(
            issues
                .iter()
                .all(|i| i.severity != ConfigSeverity::Error),
            "unexpected errors: {issues:?}"
        );
    }

    #[test]
    fn empty_resolvers_is_an_error() {
        let mut config = Config::default();
        config.identity.resolvers.clear();
        let issues = config.validate();
        assert!(issues
            .iter()
            .any(|i| i.field == "identity.resolvers" && i.severity == ConfigSeverity::Error));
    }

    #[test]
    fn zero_timeout_is_an_error() {
        let mut config = Config::default();
        config.identity.timeout_secs = 0;
        let issues = config.validate();
        assert!(issues
            .iter()
            .any(|i| i.field == "identity.timeout_secs" && i.severity == ConfigSeverity::Error));
    }

    #[test]
    fn zero_ttl_is_a_warning_not_an_error() {
        let mut config = Config::default();
        config.cache.archive_ttl_hours = 0;
        let issues = config.validate();
        let issue = issues
            .iter()
            .find(|i| i.field == "cache.archive_ttl_hours")
            .unwrap();
        assert_eq!(issue.severity, ConfigSeverity::Warning);
    }

    #[test]
    fn deserializes_from_toml_with_partial_overrides() {
        let toml_str = r#"
            [cache]
            archive_ttl_hours = 48

            [search]
            max_query_len = 200
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.cache.archive_ttl_hours, 48);
        assert_eq!(config.search.max_query_len, 200);
        // Untouched sections still pick up defaults.
        assert_eq!(config.identity.resolvers, d_resolvers());
    }

    #[test]
    fn user_agent_default_contains_crate_version() {
        let config = Config::default();
        assert!(config.http.user_agent.starts_with("autoreply/"));
    }
}
