use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "nocs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub reference_no: String,
    #[sea_orm(unique)]
    pub loan_id: String,
    pub borrower_name: String,
    pub issued_by: String,
    pub issued_at: DateTimeUtc,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
