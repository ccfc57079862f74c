use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "installments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub installment_id: i64,
    pub loan_id: String,
    pub installment_number: i32,
    pub due_date: Date,
    pub amount: i64,
    pub status: String,
    pub paid_date: Option<Date>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
