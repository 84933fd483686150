use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_FALLBACK_CONTACT: &str = "hello@immigratecabo.com";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the site service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub mail: MailConfig,
    pub site: SiteConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort { var: "APP_PORT" })?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            mail: MailConfig::from_env()?,
            site: SiteConfig {
                static_dir: non_empty_var("SITE_STATIC_DIR").map(PathBuf::from),
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Account used to authenticate against the mail relay.
///
/// The account address doubles as the sender and the staff mailbox.
#[derive(Clone, PartialEq, Eq)]
pub struct MailCredentials {
    pub account: String,
    pub app_password: String,
}

impl fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailCredentials")
            .field("account", &self.account)
            .field("app_password", &"<redacted>")
            .finish()
    }
}

/// Outbound mail settings shared by both form pipelines.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// `None` when either credential variable is unset or blank.
    pub credentials: Option<MailCredentials>,
    pub relay_host: String,
    pub relay_port: u16,
    pub fallback_contact: String,
    pub attach_documents_to_staff: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            relay_host: DEFAULT_SMTP_HOST.to_string(),
            relay_port: DEFAULT_SMTP_PORT,
            fallback_contact: DEFAULT_FALLBACK_CONTACT.to_string(),
            attach_documents_to_staff: false,
        }
    }
}

impl MailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let credentials = match (
            non_empty_var("IMMIGRATION_EMAIL"),
            non_empty_var("IMMIGRATION_APP_PASSWORD"),
        ) {
            (Some(account), Some(app_password)) => Some(MailCredentials {
                account,
                app_password,
            }),
            _ => None,
        };

        let relay_port = match non_empty_var("IMMIGRATION_SMTP_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort {
                var: "IMMIGRATION_SMTP_PORT",
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        let attach_documents_to_staff = match non_empty_var("IMMIGRATION_ATTACH_STAFF_DOCUMENTS") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                var: "IMMIGRATION_ATTACH_STAFF_DOCUMENTS",
                value: raw,
            })?,
            None => false,
        };

        Ok(Self {
            credentials,
            relay_host: non_empty_var("IMMIGRATION_SMTP_HOST")
                .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            relay_port,
            fallback_contact: non_empty_var("IMMIGRATION_FALLBACK_CONTACT")
                .unwrap_or_else(|| DEFAULT_FALLBACK_CONTACT.to_string()),
            attach_documents_to_staff,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}

/// Optional static marketing pages served next to the API.
#[derive(Debug, Clone, Default)]
pub struct SiteConfig {
    pub static_dir: Option<PathBuf>,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort { var: &'static str },
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { var: &'static str, value: String },
    MissingMailCredentials,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort { var } => write!(f, "{var} must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { var, value } => {
                write!(f, "{var} must be true or false (got '{value}')")
            }
            ConfigError::MissingMailCredentials => write!(
                f,
                "IMMIGRATION_EMAIL and IMMIGRATION_APP_PASSWORD must both be set"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort { .. }
            | ConfigError::InvalidFlag { .. }
            | ConfigError::MissingMailCredentials => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
