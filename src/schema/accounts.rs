use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use sea_orm_migration::prelude::*;

pub async fn apply(manager: &SchemaManager<'_>, conn: &DatabaseConnection) -> Result<(), DbErr> {
    if manager.has_table("accounts").await? {
        return Ok(());
    }

    manager
        .create_table(
            Table::create()
                .table(Accounts::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Accounts::Id)
                        .big_integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(Accounts::Uid).uuid().not_null())
                .col(
                    ColumnDef::new(Accounts::AccountType)
                        .string()
                        .not_null()
                        .default("user"),
                )
                .col(ColumnDef::new(Accounts::Email).string().not_null())
                .col(ColumnDef::new(Accounts::PasswordHash).string().not_null())
                .col(ColumnDef::new(Accounts::Salt).string().not_null())
                .col(ColumnDef::new(Accounts::Encoder).string().not_null())
                .col(
                    ColumnDef::new(Accounts::Enabled)
                        .boolean()
                        .not_null()
                        .default(true),
                )
                .col(
                    ColumnDef::new(Accounts::Locked)
                        .boolean()
                        .not_null()
                        .default(false),
                )
                .col(ColumnDef::new(Accounts::Roles).json_binary().not_null())
                .col(ColumnDef::new(Accounts::Phone).string())
                .col(ColumnDef::new(Accounts::Website).string())
                .col(ColumnDef::new(Accounts::Facebook).string())
                .col(ColumnDef::new(Accounts::Twitter).string())
                .col(ColumnDef::new(Accounts::About).text())
                .col(ColumnDef::new(Accounts::LastLogin).timestamp_with_time_zone())
                .col(
                    ColumnDef::new(Accounts::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(SimpleExpr::Custom("now()".into())),
                )
                .col(
                    ColumnDef::new(Accounts::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(SimpleExpr::Custom("now()".into())),
                )
                .to_owned(),
        )
        .await?;

    conn.execute(Statement::from_string(
        DbBackend::Postgres,
        "ALTER TABLE accounts ADD CONSTRAINT accounts_account_type_check \
         CHECK (account_type IN ('user','team','robot'))"
            .to_string(),
    ))
    .await?;

    conn.execute(Statement::from_string(
        DbBackend::Postgres,
        "CREATE UNIQUE INDEX IF NOT EXISTS accounts_uid_unique ON accounts (uid)".to_string(),
    ))
    .await?;

    // Email is matched case-sensitively, so the index is on the raw column.
    conn.execute(Statement::from_string(
        DbBackend::Postgres,
        "CREATE UNIQUE INDEX IF NOT EXISTS accounts_email_unique ON accounts (email)".to_string(),
    ))
    .await?;

    Ok(())
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Uid,
    AccountType,
    Email,
    PasswordHash,
    Salt,
    Encoder,
    Enabled,
    Locked,
    Roles,
    Phone,
    Website,
    Facebook,
    Twitter,
    About,
    LastLogin,
    CreatedAt,
    UpdatedAt,
}
