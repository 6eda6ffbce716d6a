use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uid: Uuid,
    pub account_type: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub encoder: String,
    pub enabled: bool,
    pub locked: bool,
    pub roles: Json,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub about: Option<String>,
    pub last_login: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Role tags stored on the account. Non-string entries are ignored.
    pub fn role_set(&self) -> Vec<String> {
        match &self.roles {
            Json::Array(values) => values
                .iter()
                .filter_map(|value| value.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

pub fn roles_json<I, S>(roles: I) -> Json
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Json::Array(
        roles
            .into_iter()
            .map(|role| Json::String(role.into()))
            .collect(),
    )
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    User,
    Team,
    Robot,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::User => "user",
            AccountType::Team => "team",
            AccountType::Robot => "robot",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(AccountType::User),
            "team" => Ok(AccountType::Team),
            "robot" => Ok(AccountType::Robot),
            other => Err(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_json_round_trips_through_role_set() {
        let json = roles_json([ROLE_USER, ROLE_ADMIN]);
        let model = crate::testing::account_model(1, "a@x.com", json);
        assert_eq!(model.role_set(), vec![ROLE_USER, ROLE_ADMIN]);
    }

    #[test]
    fn role_set_ignores_non_array_values() {
        let model = crate::testing::account_model(1, "a@x.com", Json::Null);
        assert!(model.role_set().is_empty());
    }

    #[test]
    fn account_type_parses_known_names() {
        assert_eq!("user".parse::<AccountType>(), Ok(AccountType::User));
        assert_eq!("robot".parse::<AccountType>(), Ok(AccountType::Robot));
        assert_eq!("admin".parse::<AccountType>(), Err("admin".to_string()));
    }
}
