use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "catalog_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub price_special: Option<Decimal>,
    pub price_special_from: Option<DateTimeWithTimeZone>,
    pub price_special_to: Option<DateTimeWithTimeZone>,
    pub is_new: bool,
    pub new_from: Option<DateTimeWithTimeZone>,
    pub new_to: Option<DateTimeWithTimeZone>,
    pub description_short: Option<String>,
    pub description: String,
    pub status: bool,
    pub comment_status: bool,
    pub hidden: bool,
    #[sea_orm(unique)]
    pub meta_url: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
