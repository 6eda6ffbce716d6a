#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub redis_url: Option<String>,
    pub session_ttl_seconds: u64,
    pub session_key_prefix: String,
    pub cookie_secure: bool,
    pub cookie_domain: Option<String>,

    // Account mails are skipped (with a log line) unless EMAIL_FROM and a provider are set.
    pub email_provider: Option<String>,
    pub email_from: Option<String>,
    pub resend_api_key: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_starttls: bool,
    pub login_url: Option<String>,

    pub generated_password_length: usize,
    pub fixtures_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3333,
            redis_url: None,
            session_ttl_seconds: 60 * 60 * 24 * 7,
            session_key_prefix: "storefront".to_string(),
            cookie_secure: false,
            cookie_domain: None,
            email_provider: None,
            email_from: None,
            resend_api_key: None,
            smtp_host: None,
            smtp_port: None,
            smtp_username: None,
            smtp_password: None,
            smtp_starttls: false,
            login_url: None,
            generated_password_length: 10,
            fixtures_path: None,
        }
    }
}
