use sea_orm::entity::prelude::*;

/// 金额列存储最小货币单位（派萨），`roi_bps` 为以基点表示的利率
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "loans_master")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub loan_id: String,
    pub client_id: Option<i64>,
    pub customer_name: String,
    pub branch: String,
    pub sourced_by: Option<String>,
    pub loan_amount: i64,
    pub processing_fee: i64,
    pub gst: i64,
    pub net_disbursement: i64,
    pub repayment_amount: i64,
    pub interest_earned: i64,
    pub roi_bps: i64,
    pub tenure_days: i32,
    pub date_of_disbursement: Date,
    pub installment_amount: i64,
    pub total_installments: i32,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub closed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
