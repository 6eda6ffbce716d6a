use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use sea_orm_migration::prelude::*;

pub async fn apply(manager: &SchemaManager<'_>, conn: &DatabaseConnection) -> Result<(), DbErr> {
    if manager.has_table("catalog_entries").await? {
        return Ok(());
    }

    manager
        .create_table(
            Table::create()
                .table(CatalogEntries::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(CatalogEntries::Id)
                        .big_integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(CatalogEntries::Name).string().not_null())
                .col(ColumnDef::new(CatalogEntries::Sku).string())
                .col(ColumnDef::new(CatalogEntries::Price).decimal_len(12, 2))
                .col(ColumnDef::new(CatalogEntries::PriceSpecial).decimal_len(12, 2))
                .col(ColumnDef::new(CatalogEntries::PriceSpecialFrom).timestamp_with_time_zone())
                .col(ColumnDef::new(CatalogEntries::PriceSpecialTo).timestamp_with_time_zone())
                .col(
                    ColumnDef::new(CatalogEntries::IsNew)
                        .boolean()
                        .not_null()
                        .default(false),
                )
                .col(ColumnDef::new(CatalogEntries::NewFrom).timestamp_with_time_zone())
                .col(ColumnDef::new(CatalogEntries::NewTo).timestamp_with_time_zone())
                .col(ColumnDef::new(CatalogEntries::DescriptionShort).text())
                .col(ColumnDef::new(CatalogEntries::Description).text().not_null())
                .col(
                    ColumnDef::new(CatalogEntries::Status)
                        .boolean()
                        .not_null()
                        .default(false),
                )
                .col(
                    ColumnDef::new(CatalogEntries::CommentStatus)
                        .boolean()
                        .not_null()
                        .default(false),
                )
                .col(
                    ColumnDef::new(CatalogEntries::Hidden)
                        .boolean()
                        .not_null()
                        .default(false),
                )
                .col(ColumnDef::new(CatalogEntries::MetaUrl).string().not_null())
                .col(ColumnDef::new(CatalogEntries::MetaTitle).string())
                .col(ColumnDef::new(CatalogEntries::MetaDescription).text())
                .col(ColumnDef::new(CatalogEntries::MetaKeywords).text())
                .col(
                    ColumnDef::new(CatalogEntries::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(CatalogEntries::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null(),
                )
                .to_owned(),
        )
        .await?;

    conn.execute(Statement::from_string(
        DbBackend::Postgres,
        "CREATE UNIQUE INDEX IF NOT EXISTS catalog_entries_meta_url_unique \
         ON catalog_entries (meta_url)"
            .to_string(),
    ))
    .await?;

    Ok(())
}

#[derive(Iden)]
enum CatalogEntries {
    Table,
    Id,
    Name,
    Sku,
    Price,
    PriceSpecial,
    PriceSpecialFrom,
    PriceSpecialTo,
    IsNew,
    NewFrom,
    NewTo,
    DescriptionShort,
    Description,
    Status,
    CommentStatus,
    Hidden,
    MetaUrl,
    MetaTitle,
    MetaDescription,
    MetaKeywords,
    CreatedAt,
    UpdatedAt,
}
