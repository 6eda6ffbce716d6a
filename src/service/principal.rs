use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::entities::accounts;

/// Identity resolved once at the request boundary and passed down explicitly.
#[derive(Clone, Debug)]
pub enum Principal {
    Anonymous,
    Account(AuthenticatedAccount),
}

impl Principal {
    pub fn has_role(&self, role: &str) -> bool {
        match self {
            Principal::Anonymous => false,
            Principal::Account(authenticated) => authenticated.has_role(role),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthenticatedAccount {
    account: accounts::Model,
    roles: BTreeSet<String>,
}

impl AuthenticatedAccount {
    pub fn new(account: accounts::Model) -> Self {
        let roles = account.role_set().into_iter().collect();
        Self { account, roles }
    }

    pub fn account(&self) -> &accounts::Model {
        &self.account
    }

    pub fn into_account(self) -> accounts::Model {
        self.account
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// What a session remembers about its account between requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPrincipal {
    pub account_id: i64,
    pub account_type: String,
}

impl From<&accounts::Model> for SessionPrincipal {
    fn from(account: &accounts::Model) -> Self {
        Self {
            account_id: account.id,
            account_type: account.account_type.clone(),
        }
    }
}
