use sea_orm::{Database, DatabaseConnection, DbErr};
use std::env;
use tokio::net::lookup_host;

fn redact_db_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let (authority, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    let authority = match authority.rsplit_once('@') {
        Some((userinfo, host)) => match userinfo.split_once(':') {
            Some((user, _)) => format!("{user}:***@{host}"),
            None => format!("{userinfo}@{host}"),
        },
        None => authority.to_string(),
    };
    format!("{scheme}://{authority}{path}")
}

fn extract_host_port(url: &str) -> Option<(String, u16)> {
    let after_scheme = url.split("://").nth(1)?;
    let authority = after_scheme.split('/').next().unwrap_or(after_scheme);
    let hostport = authority.rsplit('@').next().unwrap_or(authority);
    let mut parts = hostport.split(':');
    let host = parts.next()?.to_string();
    let port = parts
        .next()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(5432);
    Some((host, port))
}

pub async fn connect() -> Result<DatabaseConnection, DbErr> {
    let url = env::var("DATABASE_URL")
        .map_err(|_| DbErr::Custom("DATABASE_URL is not set".to_string()))?;
    tracing::info!(database_url = %redact_db_url(&url), "connecting to database");

    if let Some((host, port)) = extract_host_port(&url) {
        match lookup_host((host.as_str(), port)).await {
            Ok(addrs) => {
                let list: Vec<String> = addrs.map(|addr| addr.to_string()).collect();
                tracing::debug!(%host, port, addrs = ?list, "database host resolved");
            }
            Err(err) => {
                tracing::warn!(%host, port, error = %err, "database host lookup failed");
            }
        }
    }
    Database::connect(url).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_password_only() {
        assert_eq!(
            redact_db_url("postgres://shop:secret@db:5432/storefront"),
            "postgres://shop:***@db:5432/storefront"
        );
    }

    #[test]
    fn leaves_urls_without_credentials_alone() {
        assert_eq!(
            redact_db_url("postgres://db:5432/storefront"),
            "postgres://db:5432/storefront"
        );
        assert_eq!(redact_db_url("not a url"), "not a url");
    }

    #[test]
    fn extracts_host_and_default_port() {
        assert_eq!(
            extract_host_port("postgres://u:p@db/storefront"),
            Some(("db".to_string(), 5432))
        );
        assert_eq!(
            extract_host_port("postgres://db:6543/storefront"),
            Some(("db".to_string(), 6543))
        );
    }
}
