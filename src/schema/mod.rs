use sea_orm::{DatabaseConnection, DbErr};
use sea_orm_migration::prelude::*;

mod accounts;
mod catalog_entries;

pub async fn apply(conn: &DatabaseConnection) -> Result<(), DbErr> {
    let manager = SchemaManager::new(conn);

    accounts::apply(&manager, conn).await?;
    catalog_entries::apply(&manager, conn).await?;

    Ok(())
}
