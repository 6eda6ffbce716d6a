use std::{env, sync::Arc};

use crate::config::Config;

const MIN_GENERATED_PASSWORD_LENGTH: usize = 8;

pub trait ConfigService: Send + Sync {
    fn port(&self) -> u16;
    fn values(&self) -> &Config;
}

pub struct ConfigServiceImpl {
    config: Arc<Config>,
}

impl ConfigServiceImpl {
    fn strip_wrapping_quotes(value: &str) -> &str {
        if value.len() >= 2 {
            let bytes = value.as_bytes();
            let first = bytes[0];
            let last = bytes[value.len() - 1];
            if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
                return &value[1..value.len() - 1];
            }
        }
        value
    }

    fn env_nonempty(key: &str) -> Option<String> {
        env::var(key).ok().and_then(|value| {
            let normalized = Self::strip_wrapping_quotes(value.trim()).trim();
            if normalized.is_empty() {
                None
            } else {
                Some(normalized.to_string())
            }
        })
    }

    fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
        Self::env_nonempty(key).and_then(|value| value.parse::<T>().ok())
    }

    fn env_bool(key: &str, default: bool) -> bool {
        Self::env_nonempty(key)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }

    pub fn new() -> Self {
        Self::from_config(Self::load())
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    fn load() -> Config {
        let defaults = Config::default();

        let generated_password_length = Self::env_parse::<usize>("GENERATED_PASSWORD_LENGTH")
            .unwrap_or(defaults.generated_password_length)
            .max(MIN_GENERATED_PASSWORD_LENGTH);

        Config {
            port: Self::env_parse("PORT").unwrap_or(defaults.port),
            redis_url: Self::env_nonempty("REDIS_URL"),
            session_ttl_seconds: Self::env_parse("SESSION_TTL_SECONDS")
                .unwrap_or(defaults.session_ttl_seconds),
            session_key_prefix: Self::env_nonempty("SESSION_KEY_PREFIX")
                .unwrap_or(defaults.session_key_prefix),
            cookie_secure: Self::env_bool("COOKIE_SECURE", false),
            cookie_domain: Self::env_nonempty("COOKIE_DOMAIN"),
            email_provider: Self::env_nonempty("EMAIL_PROVIDER")
                .map(|value| value.to_ascii_lowercase()),
            email_from: Self::env_nonempty("EMAIL_FROM"),
            resend_api_key: Self::env_nonempty("RESEND_API_KEY"),
            smtp_host: Self::env_nonempty("SMTP_HOST"),
            smtp_port: Self::env_parse("SMTP_PORT"),
            smtp_username: Self::env_nonempty("SMTP_USERNAME"),
            smtp_password: Self::env_nonempty("SMTP_PASSWORD"),
            smtp_starttls: Self::env_bool("SMTP_STARTTLS", false),
            login_url: Self::env_nonempty("LOGIN_URL"),
            generated_password_length,
            fixtures_path: Self::env_nonempty("FIXTURES_PATH"),
        }
    }
}

impl ConfigService for ConfigServiceImpl {
    fn port(&self) -> u16 {
        self.config.port
    }

    fn values(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_matching_quotes_only() {
        assert_eq!(ConfigServiceImpl::strip_wrapping_quotes("\"abc\""), "abc");
        assert_eq!(ConfigServiceImpl::strip_wrapping_quotes("'abc'"), "abc");
        assert_eq!(ConfigServiceImpl::strip_wrapping_quotes("\"abc'"), "\"abc'");
        assert_eq!(ConfigServiceImpl::strip_wrapping_quotes("\""), "\"");
    }

    #[test]
    fn from_config_exposes_values() {
        let service = ConfigServiceImpl::from_config(Config {
            port: 4444,
            ..Config::default()
        });
        assert_eq!(service.port(), 4444);
        assert_eq!(service.values().session_key_prefix, "storefront");
    }
}
