use async_trait::async_trait;
use lettre::{
    message::{header, Mailbox, Message},
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use reqwest::StatusCode;
use serde::Serialize;
use std::{sync::Arc, time::Duration};

use crate::{config::Config, entities::accounts};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail configuration error: {0}")]
    Config(String),
    #[error("invalid address: {0}")]
    Address(String),
    #[error("smtp delivery failed: {0}")]
    Smtp(String),
    #[error("resend delivery failed: {0}")]
    Resend(String),
}

/// Outbound account notifications. Both mails carry the plaintext password.
#[async_trait]
pub trait AccountMailer: Send + Sync {
    async fn send_registration_mail(
        &self,
        account: &accounts::Model,
        plaintext: &str,
    ) -> Result<(), MailError>;
    async fn send_new_password_mail(
        &self,
        account: &accounts::Model,
        plaintext: &str,
    ) -> Result<(), MailError>;
}

#[derive(Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

struct OutgoingMail<'a> {
    to: &'a str,
    subject: &'a str,
    html: String,
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn login_link(login_url: Option<&str>, email: &str) -> Option<String> {
    login_url.map(|base| {
        format!(
            "{}?email={}",
            base.trim_end_matches('/'),
            urlencoding::encode(email)
        )
    })
}

fn build_credentials_email_html(
    heading: &str,
    intro: &str,
    email: &str,
    plaintext: &str,
    login_url: Option<&str>,
) -> String {
    let login = match login_link(login_url, email) {
        Some(url) => format!(
            "<p style=\"margin:0 0 12px\"><a href=\"{url}\">Sign in</a></p>",
            url = escape_html(&url)
        ),
        None => String::new(),
    };
    format!(
        concat!(
            "<div style=\"font-family:ui-sans-serif,system-ui,-apple-system,Segoe UI,Roboto,Helvetica,Arial;line-height:1.5\">",
            "<h2 style=\"margin:0 0 12px\">{heading}</h2>",
            "<p style=\"margin:0 0 12px\">{intro}</p>",
            "<p style=\"margin:0 0 4px\">Email: <strong>{email}</strong></p>",
            "<p style=\"margin:0 0 12px\">Password: <strong>{password}</strong></p>",
            "{login}",
            "<p style=\"margin:18px 0 0;color:#666;font-size:12px\">Keep this email for your records.</p>",
            "</div>"
        ),
        heading = heading,
        intro = intro,
        email = escape_html(email),
        password = escape_html(plaintext),
        login = login,
    )
}

pub struct ConfiguredMailer {
    config: Arc<Config>,
}

impl ConfiguredMailer {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    async fn deliver(&self, mail: OutgoingMail<'_>) -> Result<(), MailError> {
        let cfg = self.config.as_ref();
        let Some(from) = cfg.email_from.as_deref() else {
            tracing::info!(subject = mail.subject, "EMAIL_FROM not set; skipping account mail");
            return Ok(());
        };

        let provider = cfg.email_provider.as_deref().unwrap_or("auto");
        match provider {
            "smtp" => {
                let (Some(host), Some(port)) = (cfg.smtp_host.as_deref(), cfg.smtp_port) else {
                    return Err(MailError::Config(
                        "EMAIL_PROVIDER=smtp but SMTP_HOST/SMTP_PORT are missing".to_string(),
                    ));
                };
                send_email_smtp(cfg, host, port, from, &mail).await
            }
            "resend" => {
                let Some(api_key) = cfg.resend_api_key.as_deref() else {
                    return Err(MailError::Config(
                        "EMAIL_PROVIDER=resend but RESEND_API_KEY is missing".to_string(),
                    ));
                };
                send_email_resend(api_key, from, &mail).await
            }
            "auto" => {
                if let (Some(host), Some(port)) = (cfg.smtp_host.as_deref(), cfg.smtp_port) {
                    return send_email_smtp(cfg, host, port, from, &mail).await;
                }
                if let Some(api_key) = cfg.resend_api_key.as_deref() {
                    return send_email_resend(api_key, from, &mail).await;
                }
                tracing::info!(subject = mail.subject, "no mail provider configured; skipping");
                Ok(())
            }
            other => Err(MailError::Config(format!(
                "unsupported EMAIL_PROVIDER={}, expected smtp|resend|auto",
                other
            ))),
        }
    }
}

#[async_trait]
impl AccountMailer for ConfiguredMailer {
    async fn send_registration_mail(
        &self,
        account: &accounts::Model,
        plaintext: &str,
    ) -> Result<(), MailError> {
        let html = build_credentials_email_html(
            "Welcome aboard",
            "Your account has been created. Your sign-in details:",
            &account.email,
            plaintext,
            self.config.login_url.as_deref(),
        );
        self.deliver(OutgoingMail {
            to: &account.email,
            subject: "Your new account",
            html,
        })
        .await?;
        tracing::info!(account_id = account.id, "registration mail dispatched");
        Ok(())
    }

    async fn send_new_password_mail(
        &self,
        account: &accounts::Model,
        plaintext: &str,
    ) -> Result<(), MailError> {
        let html = build_credentials_email_html(
            "Your password was reset",
            "A new password has been generated for your account:",
            &account.email,
            plaintext,
            self.config.login_url.as_deref(),
        );
        self.deliver(OutgoingMail {
            to: &account.email,
            subject: "Your new password",
            html,
        })
        .await?;
        tracing::info!(account_id = account.id, "new password mail dispatched");
        Ok(())
    }
}

async fn send_email_resend(
    api_key: &str,
    from: &str,
    mail: &OutgoingMail<'_>,
) -> Result<(), MailError> {
    let client = reqwest::Client::new();
    let payload = ResendEmailRequest {
        from,
        to: vec![mail.to],
        subject: mail.subject,
        html: &mail.html,
    };

    let res = client
        .post("https://api.resend.com/emails")
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&payload)
        .send()
        .await
        .map_err(|err| MailError::Resend(format!("request failed: {}", err)))?;

    if res.status() == StatusCode::OK || res.status() == StatusCode::CREATED {
        return Ok(());
    }

    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    Err(MailError::Resend(format!("returned {}: {}", status, body)))
}

async fn send_email_smtp(
    cfg: &Config,
    host: &str,
    port: u16,
    from: &str,
    mail: &OutgoingMail<'_>,
) -> Result<(), MailError> {
    let from: Mailbox = from
        .parse()
        .map_err(|err| MailError::Address(format!("EMAIL_FROM: {}", err)))?;
    let to: Mailbox = mail
        .to
        .parse()
        .map_err(|err| MailError::Address(format!("recipient: {}", err)))?;

    let msg = Message::builder()
        .from(from)
        .to(to)
        .subject(mail.subject)
        .header(header::ContentType::TEXT_HTML)
        .body(mail.html.clone())
        .map_err(|err| MailError::Smtp(format!("build message failed: {}", err)))?;

    let mut builder = if cfg.smtp_starttls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|err| MailError::Smtp(format!("transport init failed: {}", err)))?
            .port(port)
            .timeout(Some(Duration::from_secs(10)))
    } else {
        // Mailpit (local/CI) uses plain SMTP by default.
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .timeout(Some(Duration::from_secs(10)))
    };

    if let (Some(username), Some(password)) =
        (cfg.smtp_username.as_deref(), cfg.smtp_password.as_deref())
    {
        builder = builder.credentials(lettre::transport::smtp::authentication::Credentials::new(
            username.to_string(),
            password.to_string(),
        ));
    }

    builder
        .build()
        .send(msg)
        .await
        .map_err(|err| MailError::Smtp(err.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escapes_generated_symbols() {
        let html = build_credentials_email_html("Hi", "Intro", "a@x.com", "Ab3&<k>", None);
        assert!(html.contains("Ab3&amp;&lt;k&gt;"));
        assert!(!html.contains("Sign in"));
    }

    #[test]
    fn login_link_encodes_email() {
        assert_eq!(
            login_link(Some("https://shop.example/login/"), "a+b@x.com").as_deref(),
            Some("https://shop.example/login?email=a%2Bb%40x.com")
        );
        assert_eq!(login_link(None, "a@x.com"), None);
    }

    #[tokio::test]
    async fn unconfigured_mailer_is_a_no_op() {
        let mailer = ConfiguredMailer::new(Arc::new(Config::default()));
        let account = crate::testing::account_model(
            1,
            "a@x.com",
            accounts::roles_json([accounts::ROLE_USER]),
        );
        mailer
            .send_registration_mail(&account, "pw1")
            .await
            .expect("no-op send");
    }

    #[tokio::test]
    async fn unknown_provider_is_a_config_error() {
        let mailer = ConfiguredMailer::new(Arc::new(Config {
            email_from: Some("shop@x.com".to_string()),
            email_provider: Some("carrier-pigeon".to_string()),
            ..Config::default()
        }));
        let account = crate::testing::account_model(
            1,
            "a@x.com",
            accounts::roles_json([accounts::ROLE_USER]),
        );
        let err = mailer
            .send_new_password_mail(&account, "pw1")
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::Config(_)));
    }
}
