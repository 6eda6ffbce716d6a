use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveValue::Set, DbErr};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::accounts::{self, roles_json, AccountType, ROLE_USER},
    repo::accounts::AccountsRepo,
    service::{
        email::{AccountMailer, MailError},
        encoder::{Credential, EncoderError, EncoderFactory},
        password::PasswordGenerator,
        principal::{Principal, SessionPrincipal},
    },
};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Refreshing a principal whose account type this manager does not own.
    #[error("instances of \"{type_name}\" are not supported")]
    UnsupportedPrincipal { type_name: String },
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account is disabled")]
    Disabled,
    #[error("account is locked")]
    Locked,
    #[error("fixture for {email} has neither a password nor a stored credential")]
    IncompleteFixture { email: String },
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error(transparent)]
    Credential(#[from] EncoderError),
    #[error(transparent)]
    Mail(#[from] MailError),
}

impl AccountError {
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::UnsupportedPrincipal { .. } => "unsupported_principal",
            AccountError::InvalidCredentials => "invalid_credentials",
            AccountError::Disabled => "account_disabled",
            AccountError::Locked => "account_locked",
            AccountError::IncompleteFixture { .. } => "invalid_fixture",
            AccountError::Db(_) => "db_error",
            AccountError::Credential(_) => "password_hash_failed",
            AccountError::Mail(_) => "mail_error",
        }
    }
}

/// Optional profile attributes. `None` means "leave as is".
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct ProfileFields {
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub about: Option<String>,
}

impl ProfileFields {
    /// Marks only the present fields as changed.
    fn apply_to(self, active: &mut accounts::ActiveModel) {
        if let Some(phone) = self.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(website) = self.website {
            active.website = Set(Some(website));
        }
        if let Some(facebook) = self.facebook {
            active.facebook = Set(Some(facebook));
        }
        if let Some(twitter) = self.twitter {
            active.twitter = Set(Some(twitter));
        }
        if let Some(about) = self.about {
            active.about = Set(Some(about));
        }
    }
}

/// Pre-hashed credential carried over from another store.
#[derive(Clone, Debug, Deserialize)]
pub struct StoredCredential {
    pub password_hash: String,
    pub salt: String,
    pub encoder: String,
}

fn default_enabled() -> bool {
    true
}

/// Bootstrap/test account seeded without any notification.
#[derive(Clone, Debug, Deserialize)]
pub struct FixtureAccount {
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub credential: Option<StoredCredential>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub account_type: Option<AccountType>,
    #[serde(flatten)]
    pub profile: ProfileFields,
}

#[derive(Debug)]
pub struct RegisterOutput {
    pub account: accounts::Model,
    pub created: bool,
}

#[async_trait]
pub trait AccountManager: Send + Sync {
    /// Loads `account_id` when given; otherwise the principal's account if it
    /// carries `ROLE_USER`. `None` for the principal means no token at all.
    async fn resolve_current_account(
        &self,
        principal: Option<&Principal>,
        account_id: Option<i64>,
    ) -> Result<Option<accounts::Model>, AccountError>;
    fn verify_credential(&self, account: &accounts::Model, candidate: &str) -> bool;
    async fn register_account(
        &self,
        email: &str,
        plaintext: &str,
        profile: ProfileFields,
    ) -> Result<RegisterOutput, AccountError>;
    async fn register_fixture_account(
        &self,
        fixture: FixtureAccount,
    ) -> Result<accounts::Model, AccountError>;
    async fn update_profile(
        &self,
        account: &accounts::Model,
        fields: ProfileFields,
    ) -> Result<accounts::Model, AccountError>;
    async fn reset_credential(
        &self,
        account: Option<&accounts::Model>,
    ) -> Result<Option<accounts::Model>, AccountError>;
    async fn authenticate(
        &self,
        email: &str,
        plaintext: &str,
    ) -> Result<accounts::Model, AccountError>;
    async fn load_by_email(&self, email: &str) -> Result<Option<accounts::Model>, AccountError>;
    async fn load_by_id(&self, id: i64) -> Result<Option<accounts::Model>, AccountError>;
    async fn refresh_account(
        &self,
        principal: &SessionPrincipal,
    ) -> Result<Option<accounts::Model>, AccountError>;
}

pub struct AccountManagerImpl {
    accounts_repo: Arc<dyn AccountsRepo>,
    encoders: Arc<EncoderFactory>,
    mailer: Arc<dyn AccountMailer>,
    passwords: Arc<dyn PasswordGenerator>,
}

impl AccountManagerImpl {
    pub fn new(
        accounts_repo: Arc<dyn AccountsRepo>,
        encoders: Arc<EncoderFactory>,
        mailer: Arc<dyn AccountMailer>,
        passwords: Arc<dyn PasswordGenerator>,
    ) -> Self {
        Self {
            accounts_repo,
            encoders,
            mailer,
            passwords,
        }
    }

    fn supports_account_type(account_type: &str) -> bool {
        matches!(account_type.parse::<AccountType>(), Ok(AccountType::User))
    }

    fn new_account(
        email: &str,
        credential: Credential,
        profile: ProfileFields,
    ) -> accounts::Model {
        let now = Utc::now();
        accounts::Model {
            id: 0,
            uid: Uuid::new_v4(),
            account_type: AccountType::User.to_string(),
            email: email.to_string(),
            password_hash: credential.password_hash,
            salt: credential.salt,
            encoder: credential.encoder,
            enabled: true,
            locked: false,
            roles: roles_json([ROLE_USER]),
            phone: profile.phone,
            website: profile.website,
            facebook: profile.facebook,
            twitter: profile.twitter,
            about: profile.about,
            last_login: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn set_credential(active: &mut accounts::ActiveModel, credential: Credential) {
        active.password_hash = Set(credential.password_hash);
        active.salt = Set(credential.salt);
        active.encoder = Set(credential.encoder);
        active.updated_at = Set(Utc::now().into());
    }

    /// Inserts `account`, or returns the row that won a concurrent insert for
    /// the same email. The flag is true when this call created the row.
    async fn insert_or_existing(
        &self,
        account: accounts::Model,
    ) -> Result<(accounts::Model, bool), AccountError> {
        let email = account.email.clone();
        if let Some(inserted) = self.accounts_repo.insert(account).await? {
            return Ok((inserted, true));
        }

        tracing::warn!(%email, "concurrent registration lost the race; reusing stored account");
        match self.accounts_repo.find_by_email(&email).await? {
            Some(existing) => Ok((existing, false)),
            // The conflicting row is not ours to return (uid collision).
            None => Err(DbErr::RecordNotInserted.into()),
        }
    }
}

#[async_trait]
impl AccountManager for AccountManagerImpl {
    async fn resolve_current_account(
        &self,
        principal: Option<&Principal>,
        account_id: Option<i64>,
    ) -> Result<Option<accounts::Model>, AccountError> {
        if let Some(id) = account_id {
            return self.load_by_id(id).await;
        }

        match principal {
            Some(Principal::Account(authenticated)) if authenticated.has_role(ROLE_USER) => {
                Ok(Some(authenticated.account().clone()))
            }
            _ => Ok(None),
        }
    }

    fn verify_credential(&self, account: &accounts::Model, candidate: &str) -> bool {
        let Some(encoder) = self.encoders.get_encoder(account) else {
            tracing::warn!(
                account_id = account.id,
                encoder = %account.encoder,
                "no password encoder registered for account"
            );
            return false;
        };
        encoder.is_password_valid(&account.password_hash, candidate, &account.salt)
    }

    async fn register_account(
        &self,
        email: &str,
        plaintext: &str,
        profile: ProfileFields,
    ) -> Result<RegisterOutput, AccountError> {
        if let Some(existing) = self.load_by_email(email).await? {
            return Ok(RegisterOutput {
                account: existing,
                created: false,
            });
        }

        let credential = self.encoders.derive_credential(plaintext)?;
        let account = Self::new_account(email, credential, profile);

        let (account, created) = self.insert_or_existing(account).await?;
        if created {
            tracing::info!(account_id = account.id, "account registered");
            self.mailer.send_registration_mail(&account, plaintext).await?;
        }

        Ok(RegisterOutput { account, created })
    }

    async fn register_fixture_account(
        &self,
        fixture: FixtureAccount,
    ) -> Result<accounts::Model, AccountError> {
        if let Some(existing) = self.load_by_email(&fixture.email).await? {
            return Ok(existing);
        }

        let credential = match (fixture.credential, fixture.password.as_deref()) {
            (Some(stored), _) => Credential {
                password_hash: stored.password_hash,
                salt: stored.salt,
                encoder: stored.encoder,
            },
            (None, Some(password)) => self.encoders.derive_credential(password)?,
            (None, None) => {
                return Err(AccountError::IncompleteFixture {
                    email: fixture.email,
                })
            }
        };

        let mut account = Self::new_account(&fixture.email, credential, fixture.profile);
        account.enabled = fixture.enabled;
        account.locked = fixture.locked;
        account.last_login = Some(Utc::now().into());
        if let Some(roles) = fixture.roles {
            account.roles = roles_json(roles);
        }
        if let Some(account_type) = fixture.account_type {
            account.account_type = account_type.to_string();
        }

        let (account, _) = self.insert_or_existing(account).await?;
        tracing::debug!(account_id = account.id, "fixture account seeded");
        Ok(account)
    }

    async fn update_profile(
        &self,
        account: &accounts::Model,
        fields: ProfileFields,
    ) -> Result<accounts::Model, AccountError> {
        let mut active: accounts::ActiveModel = account.clone().into();
        fields.apply_to(&mut active);
        active.updated_at = Set(Utc::now().into());
        Ok(self.accounts_repo.update(active).await?)
    }

    async fn reset_credential(
        &self,
        account: Option<&accounts::Model>,
    ) -> Result<Option<accounts::Model>, AccountError> {
        let Some(account) = account else {
            return Ok(None);
        };

        let password = self.passwords.generate_password();
        let mut active: accounts::ActiveModel = account.clone().into();
        Self::set_credential(&mut active, self.encoders.derive_credential(&password)?);
        let updated = self.accounts_repo.update(active).await?;

        tracing::info!(account_id = updated.id, "password reset");
        self.mailer.send_new_password_mail(&updated, &password).await?;
        Ok(Some(updated))
    }

    async fn authenticate(
        &self,
        email: &str,
        plaintext: &str,
    ) -> Result<accounts::Model, AccountError> {
        let Some(account) = self.load_by_email(email).await? else {
            return Err(AccountError::InvalidCredentials);
        };
        if !self.verify_credential(&account, plaintext) {
            return Err(AccountError::InvalidCredentials);
        }
        if !account.enabled {
            return Err(AccountError::Disabled);
        }
        if account.locked {
            return Err(AccountError::Locked);
        }
        // Sessions can only be refreshed for user accounts.
        if !Self::supports_account_type(&account.account_type) {
            return Err(AccountError::UnsupportedPrincipal {
                type_name: account.account_type,
            });
        }

        let rehash = self.encoders.needs_rehash(&account);
        if rehash {
            tracing::info!(account_id = account.id, from = %account.encoder, "upgrading password hash");
        }
        let mut active: accounts::ActiveModel = account.into();
        if rehash {
            Self::set_credential(&mut active, self.encoders.derive_credential(plaintext)?);
        }
        active.last_login = Set(Some(Utc::now().into()));
        Ok(self.accounts_repo.update(active).await?)
    }

    async fn load_by_email(&self, email: &str) -> Result<Option<accounts::Model>, AccountError> {
        Ok(self.accounts_repo.find_by_email(email).await?)
    }

    async fn load_by_id(&self, id: i64) -> Result<Option<accounts::Model>, AccountError> {
        Ok(self.accounts_repo.find_by_id(id).await?)
    }

    async fn refresh_account(
        &self,
        principal: &SessionPrincipal,
    ) -> Result<Option<accounts::Model>, AccountError> {
        if !Self::supports_account_type(&principal.account_type) {
            return Err(AccountError::UnsupportedPrincipal {
                type_name: principal.account_type.clone(),
            });
        }
        self.load_by_id(principal.account_id).await
    }
}
