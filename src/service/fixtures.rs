use crate::service::accounts::{AccountError, AccountManager, FixtureAccount};

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("cannot read fixtures from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid fixture file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Account(#[from] AccountError),
}

pub fn parse_fixtures(path: &str, raw: &str) -> Result<Vec<FixtureAccount>, FixtureError> {
    serde_json::from_str(raw).map_err(|source| FixtureError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Seeds every account in the JSON array at `path`. Returns how many were processed.
pub async fn seed_accounts_from_file(
    path: &str,
    accounts: &dyn AccountManager,
) -> Result<usize, FixtureError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FixtureError::Io {
            path: path.to_string(),
            source,
        })?;
    let fixtures = parse_fixtures(path, &raw)?;
    let count = fixtures.len();
    for fixture in fixtures {
        accounts.register_fixture_account(fixture).await?;
    }
    tracing::info!(path, count, "account fixtures seeded");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        service::{
            accounts::AccountManagerImpl, encoder::EncoderFactory,
            password::RandomPasswordGenerator,
        },
        testing::{InMemoryAccountsRepo, RecordingMailer},
    };
    use std::sync::Arc;

    #[test]
    fn parses_fixture_array() {
        let fixtures = parse_fixtures(
            "inline",
            r#"[{"email":"a@x.com","password":"pw1"},{"email":"b@x.com","password":"pw2","enabled":false,"website":"https://b.example"}]"#,
        )
        .expect("parse");
        assert_eq!(fixtures.len(), 2);
        assert!(fixtures[0].enabled);
        assert!(!fixtures[1].enabled);
        assert_eq!(
            fixtures[1].profile.website.as_deref(),
            Some("https://b.example")
        );
    }

    #[test]
    fn rejects_non_array_documents() {
        let err = parse_fixtures("inline", r#"{"email":"a@x.com"}"#).unwrap_err();
        assert!(matches!(err, FixtureError::Parse { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let repo = Arc::new(InMemoryAccountsRepo::default());
        let manager = AccountManagerImpl::new(
            repo,
            Arc::new(EncoderFactory::default()),
            Arc::new(RecordingMailer::default()),
            Arc::new(RandomPasswordGenerator::new(10)),
        );
        let err = seed_accounts_from_file("/nonexistent/fixtures.json", &manager)
            .await
            .unwrap_err();
        assert!(matches!(err, FixtureError::Io { .. }));
    }
}
