use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::auth::throttle::ThrottleConfig;
use crate::security;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        }
    }

    /// Lifetime of issued access tokens.
    pub fn token_ttl_secs(&self) -> u64 {
        match self {
            Environment::Development => 3600,
            Environment::Testing => 600,
            Environment::Production => 1800,
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub throttle: ThrottleConfig,
}

/// Problems found in the configuration, split by severity.
#[derive(Debug, Default)]
pub struct ConfigReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = ThrottleConfig::default();
        Self {
            environment: Environment::parse(&env::var("APP_ENV").unwrap_or_default()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:5001".to_string()),
            database_url: non_empty_var("DATABASE_URL"),
            jwt_secret: non_empty_var("JWT_SECRET"),
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            throttle: ThrottleConfig {
                window_secs: parse_var("LOGIN_WINDOW_SECS", defaults.window_secs),
                max_identifier_failures: parse_var("LOGIN_MAX_FAILURES", defaults.max_identifier_failures),
                ip_block_threshold: parse_var("LOGIN_IP_BLOCK_THRESHOLD", defaults.ip_block_threshold),
                ip_block_secs: parse_var("LOGIN_IP_BLOCK_SECS", defaults.ip_block_secs),
            },
        }
    }

    pub fn validate(&self) -> ConfigReport {
        let mut report = ConfigReport::default();
        let prod = self.environment.is_production();

        let mut flag = |cond: bool, msg: &str, fatal_in_prod: bool| {
            if cond {
                if fatal_in_prod && prod {
                    report.errors.push(msg.to_string());
                } else {
                    report.warnings.push(msg.to_string());
                }
            }
        };

        flag(self.database_url.is_none(), "DATABASE_URL is not set", true);
        flag(self.jwt_secret.is_none(), "JWT_SECRET is not set; tokens will not survive a restart", true);
        flag(
            self.jwt_secret.as_ref().is_some_and(|s| s.len() < 32),
            "JWT_SECRET is shorter than 32 characters",
            true,
        );
        flag(self.gemini_api_key.is_none(), "GEMINI_API_KEY is not set; diet plan generation will fail", false);

        if self.throttle.ip_block_threshold < self.throttle.max_identifier_failures {
            report.warnings.push(
                "LOGIN_IP_BLOCK_THRESHOLD is below LOGIN_MAX_FAILURES; addresses block before accounts lock"
                    .to_string(),
            );
        }
        report
    }

    /// The configured signing secret, or a random one for this process.
    pub fn jwt_secret_or_generate(&self) -> String {
        match &self.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                log::warn!("No JWT_SECRET set; generating random secret (tokens lost on restart)");
                security::generate_secure_token(32)
            }
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            log::warn!("Invalid {key} value {raw:?} ({e}), using default {default}");
            default
        }),
        Err(_) => default,
    }
}
