use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub verifier: VerifierConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("unclosed variable reference '${{' (missing '}}')")]
    UnclosedVarReference,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Self::parse(&contents)
    }

    /// Parse a YAML document after expanding `${VAR}` references.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        Ok(serde_saphyr::from_str(&expanded)?)
    }
}

/// Resolve a path relative to the config file directory.
///
/// Absolute paths are returned as-is.
pub fn resolve_path(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config_dir.join(path)
}

/// Treat an unset or empty string as absent.
///
/// `${VAR:-}` expands to an empty string, so every optional secret goes
/// through here before use.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// Defaults
// ============================================================================

/// Default file store directory (relative to config file).
pub const DEFAULT_STORE_DIR: &str = ".linkhub/store";
/// Default OAuth scope for the verification service.
pub const DEFAULT_VERIFIER_SCOPE: &str = "https://verifiedid.did.msidentity.com/.default";
/// Default dot path to the admin claim inside a credential.
pub const DEFAULT_ADMIN_CLAIM_PATH: &str = "credentialSubject.role";
/// Default expected admin claim value.
pub const DEFAULT_ADMIN_CLAIM_VALUE: &str = "admin";
/// Default admin session lifetime (15 minutes).
pub const DEFAULT_ADMIN_SESSION_TTL_MS: u64 = 900_000;
/// Default chat completion model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
/// Default chat completion API base.
pub const DEFAULT_CHAT_BASE_URL: &str = "https://api.openai.com/v1";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_request_timeout() -> u64 {
    30
}

fn default_scope() -> String {
    DEFAULT_VERIFIER_SCOPE.to_string()
}

fn default_claim_path() -> String {
    DEFAULT_ADMIN_CLAIM_PATH.to_string()
}

fn default_claim_value() -> String {
    DEFAULT_ADMIN_CLAIM_VALUE.to_string()
}

fn default_session_ttl_ms() -> u64 {
    DEFAULT_ADMIN_SESSION_TTL_MS
}

fn default_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_CHAT_BASE_URL.to_string()
}

fn default_rate_limit() -> u32 {
    5
}

fn default_window_ms() -> u64 {
    60_000
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports the following syntax (shell-compatible):
/// - `${VAR}` - Required variable, errors if not set
/// - `${VAR:-default}` - Optional variable with default value
/// - `${VAR:-}` - Optional variable, empty string if not set
/// - `$$` - Escaped `$` (only needed before `{` to prevent expansion)
///
/// Nested expansion (`${VAR:-${OTHER}}`) is not supported.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                result.push('$');
            }
            Some('{') => {
                chars.next();
                let expanded = parse_var_reference(&mut chars)?;
                result.push_str(&expanded);
            }
            _ => result.push('$'),
        }
    }

    Ok(result)
}

/// Parse a variable reference after seeing `${`.
fn parse_var_reference(
    chars: &mut std::iter::Peekable<std::str::Chars>,
) -> Result<String, ConfigError> {
    let mut var_name = String::new();
    let mut default_value: Option<String> = None;
    let mut found_closing_brace = false;

    while let Some(c) = chars.next() {
        match c {
            '}' => {
                found_closing_brace = true;
                break;
            }
            ':' if default_value.is_none() && chars.peek() == Some(&'-') => {
                chars.next();
                default_value = Some(String::new());
            }
            _ => match default_value.as_mut() {
                Some(default) => default.push(c),
                None => var_name.push(c),
            },
        }
    }

    if !found_closing_brace {
        return Err(ConfigError::UnclosedVarReference);
    }

    match std::env::var(&var_name) {
        Ok(value) => Ok(value),
        Err(_) => default_value.ok_or(ConfigError::MissingEnvVar(var_name)),
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Applies to inbound requests and to every outbound upstream call.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

// ============================================================================
// StoreConfig
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Root directory of the file backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ============================================================================
// VerifierConfig
// ============================================================================

/// Presentation-verification upstream.
///
/// Either `api_key` or the full client-credentials triple
/// (`client_id`, `client_secret`, `tenant_id`) authorizes the call.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifierConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Overrides the tenant token endpoint.
    #[serde(default)]
    pub token_url: Option<String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            client_id: None,
            client_secret: None,
            tenant_id: None,
            scope: default_scope(),
            token_url: None,
        }
    }
}

// ============================================================================
// AdminConfig
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_claim_path")]
    pub claim_path: String,
    #[serde(default = "default_claim_value")]
    pub claim_value: String,
    #[serde(default = "default_session_ttl_ms")]
    pub session_ttl_ms: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            claim_path: default_claim_path(),
            claim_value: default_claim_value(),
            session_ttl_ms: default_session_ttl_ms(),
        }
    }
}

// ============================================================================
// ChatConfig
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Completion API key. Unset means rule-based replies only.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
        }
    }
}

// ============================================================================
// RateLimitConfig
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit")]
    pub limit: u32,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: default_rate_limit(),
            window_ms: default_window_ms(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
