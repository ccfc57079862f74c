use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub payment_id: i64,
    pub loan_id: String,
    pub installment_id: i64,
    pub amount: i64,
    pub method: String,
    pub payment_date: Date,
    #[sea_orm(column_type = "Text", nullable)]
    pub remarks: Option<String>,
    pub utr: Option<String>,
    pub recorded_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
