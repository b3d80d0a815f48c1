/*
 * Responsibility
 * - Load settings from environment variables (tenant, elevated scope, denial policy, auth, limits)
 * - Validate values (fail startup when something is missing or malformed)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// How a failed subject match is reported to the caller.
///
/// `NotFound` hides whether the requested subject has any data at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DenialPolicy {
    #[default]
    Unauthorized,
    NotFound,
}

impl FromStr for DenialPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unauthorized" | "401" => Ok(Self::Unauthorized),
            "not_found" | "not-found" | "404" => Ok(Self::NotFound),
            _ => Err(ConfigError::Invalid("AUTH_DENIAL_STATUS")),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for the optional signature check on bearer credentials.
#[derive(Debug, Clone)]
pub struct TokenVerification {
    pub public_key_pem: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub tenant_domain: String,
    pub customer_care_officer_scope: String,
    pub denial_policy: DenialPolicy,

    // None: signatures are assumed to be checked upstream.
    pub token_verification: Option<TokenVerification>,

    pub request_body_limit_bytes: usize,
    pub request_timeout: Duration,

    pub consent_seed_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Treat blank values the same as unset ones.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV"));

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let tenant_domain = get("TENANT_DOMAIN")
            .map(|v| v.trim().trim_start_matches('@').to_string())
            .unwrap_or_else(|| "carbon.super".to_string());
        if tenant_domain.is_empty() {
            return Err(ConfigError::Invalid("TENANT_DOMAIN"));
        }

        let customer_care_officer_scope = get("CUSTOMER_CARE_OFFICER_SCOPE")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| "consents:read_all".to_string());

        let denial_policy = match get("AUTH_DENIAL_STATUS") {
            Some(raw) => raw.parse()?,
            None => DenialPolicy::default(),
        };

        let token_verification = match get("ACCESS_JWT_PUBLIC_KEY_PEM") {
            Some(pem) => {
                let leeway_seconds = match get("ACCESS_TOKEN_LEEWAY_SECONDS") {
                    Some(raw) => raw
                        .trim()
                        .parse::<u64>()
                        .map_err(|_| ConfigError::Invalid("ACCESS_TOKEN_LEEWAY_SECONDS"))?,
                    None => 60,
                };

                Some(TokenVerification {
                    public_key_pem: pem.replace("\\n", "\n"),
                    issuer: get("AUTH_ISSUER"),
                    audience: get("AUTH_AUDIENCE"),
                    leeway_seconds,
                })
            }
            None => None,
        };

        let request_body_limit_bytes = match get("REQUEST_BODY_LIMIT_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::Invalid("REQUEST_BODY_LIMIT_BYTES"))?,
            None => 1024 * 1024,
        };

        let request_timeout = match get("REQUEST_TIMEOUT_SECONDS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"))?,
            None => Duration::from_secs(30),
        };

        let consent_seed_file = get("CONSENT_SEED_FILE").map(PathBuf::from);

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            tenant_domain,
            customer_care_officer_scope,
            denial_policy,
            token_verification,
            request_body_limit_bytes,
            request_timeout,
            consent_seed_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.tenant_domain, "carbon.super");
        assert_eq!(config.customer_care_officer_scope, "consents:read_all");
        assert_eq!(config.denial_policy, DenialPolicy::Unauthorized);
        assert!(config.token_verification.is_none());
        assert_eq!(config.request_body_limit_bytes, 1024 * 1024);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.consent_seed_file.is_none());
    }

    #[test]
    fn reads_tenant_scope_and_denial_policy() {
        let config = config_from(&[
            ("TENANT_DOMAIN", "@t1"),
            ("CUSTOMER_CARE_OFFICER_SCOPE", "consents:admin"),
            ("AUTH_DENIAL_STATUS", "not_found"),
            ("APP_ENV", "prod"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
        ])
        .unwrap();

        assert_eq!(config.tenant_domain, "t1");
        assert_eq!(config.customer_care_officer_scope, "consents:admin");
        assert_eq!(config.denial_policy, DenialPolicy::NotFound);
        assert!(config.app_env.is_production());
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn public_key_enables_token_verification() {
        let config = config_from(&[
            ("ACCESS_JWT_PUBLIC_KEY_PEM", "-----BEGIN PUBLIC KEY-----\\nabc\\n-----END PUBLIC KEY-----"),
            ("AUTH_ISSUER", "https://issuer.example"),
            ("ACCESS_TOKEN_LEEWAY_SECONDS", "5"),
        ])
        .unwrap();

        let verification = config.token_verification.unwrap();
        assert!(verification.public_key_pem.contains("\nabc\n"));
        assert_eq!(verification.issuer.as_deref(), Some("https://issuer.example"));
        assert_eq!(verification.audience, None);
        assert_eq!(verification.leeway_seconds, 5);
    }

    #[test]
    fn rejects_invalid_values() {
        assert_eq!(
            config_from(&[("PORT", "http")]).unwrap_err(),
            ConfigError::Invalid("PORT")
        );
        assert_eq!(
            config_from(&[("AUTH_DENIAL_STATUS", "teapot")]).unwrap_err(),
            ConfigError::Invalid("AUTH_DENIAL_STATUS")
        );
        assert_eq!(
            config_from(&[("TENANT_DOMAIN", "@")]).unwrap_err(),
            ConfigError::Invalid("TENANT_DOMAIN")
        );
        assert_eq!(
            config_from(&[("REQUEST_TIMEOUT_SECONDS", "0")]).unwrap_err(),
            ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS")
        );
    }
}
