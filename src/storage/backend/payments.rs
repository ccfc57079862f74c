//! 还款查询与事务性记录

use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tracing::info;

use super::converters::{model_to_installment, model_to_payment};
use super::{CrmStorage, NewPayment, PaymentFilter, retry};
use crate::errors::{CrmError, Result};
use crate::storage::models::{Installment, InstallmentStatus, Payment};
use crate::utils::money::to_minor;

use migration::entities::{installment, payment};

fn payment_condition(filter: &PaymentFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(ref loan_id) = filter.loan_id {
        condition = condition.add(payment::Column::LoanId.eq(loan_id.clone()));
    }
    if let Some(method) = filter.method {
        condition = condition.add(payment::Column::Method.eq(method.to_string()));
    }
    if let Some(from) = filter.paid_from {
        condition = condition.add(payment::Column::PaymentDate.gte(from));
    }
    if let Some(to) = filter.paid_to {
        condition = condition.add(payment::Column::PaymentDate.lte(to));
    }
    condition
}

impl CrmStorage {
    /// 原子地插入还款记录并结清对应分期
    ///
    /// 在事务内重新读取分期，避免两笔并发还款
    /// 同时结清同一分期
    pub async fn record_payment(&self, new: &NewPayment) -> Result<(Payment, Installment)> {
        let amount = to_minor(new.amount)?;
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let current = installment::Entity::find_by_id(new.installment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                CrmError::not_found(format!("Installment {} not found", new.installment_id))
            })?;
        if current.loan_id != new.loan_id {
            return Err(CrmError::validation(format!(
                "Installment {} does not belong to loan {}",
                new.installment_id, new.loan_id
            )));
        }
        if current.status == InstallmentStatus::Paid.to_string() {
            return Err(CrmError::conflict(format!(
                "Installment {} is already paid",
                new.installment_id
            )));
        }

        let inserted = payment::ActiveModel {
            payment_id: NotSet,
            loan_id: Set(new.loan_id.clone()),
            installment_id: Set(new.installment_id),
            amount: Set(amount),
            method: Set(new.method.to_string()),
            payment_date: Set(new.payment_date),
            remarks: Set(new.remarks.clone()),
            utr: Set(new.utr.clone()),
            recorded_by: Set(new.recorded_by.clone()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| CrmError::database_operation(format!("Failed to insert payment: {}", e)))?;

        let mut settled: installment::ActiveModel = current.into();
        settled.status = Set(InstallmentStatus::Paid.to_string());
        settled.paid_date = Set(Some(new.payment_date));
        settled.updated_at = Set(now);
        let settled = settled.update(&txn).await?;

        txn.commit().await?;
        self.invalidate_count_cache();
        info!(
            "Payment {} recorded for loan {} installment #{}",
            inserted.payment_id, new.loan_id, settled.installment_number
        );

        Ok((model_to_payment(inserted)?, model_to_installment(settled)?))
    }

    pub async fn get_payment(&self, payment_id: i64) -> Result<Option<Payment>> {
        let db = &self.db;
        let model = retry::with_retry(
            &format!("get_payment({})", payment_id),
            self.retry_config,
            || async { payment::Entity::find_by_id(payment_id).one(db).await },
        )
        .await?;
        model.map(model_to_payment).transpose()
    }

    pub async fn list_payments(
        &self,
        filter: &PaymentFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Payment>, u64)> {
        let db = &self.db;
        let condition = payment_condition(filter);

        let total = self
            .cached_count(format!("payments:{:?}", filter), || async {
                payment::Entity::find()
                    .filter(condition.clone())
                    .count(db)
                    .await
            })
            .await?;

        let models = retry::with_retry("list_payments", self.retry_config, || async {
            payment::Entity::find()
                .filter(condition.clone())
                .order_by_desc(payment::Column::PaymentDate)
                .order_by_desc(payment::Column::PaymentId)
                .paginate(db, page_size)
                .fetch_page(page.saturating_sub(1))
                .await
        })
        .await?;

        let items = models
            .into_iter()
            .map(model_to_payment)
            .collect::<Result<Vec<_>>>()?;
        Ok((items, total))
    }

    pub async fn list_payments_for_loan(&self, loan_id: &str) -> Result<Vec<Payment>> {
        payment::Entity::find()
            .filter(payment::Column::LoanId.eq(loan_id.to_string()))
            .order_by_asc(payment::Column::PaymentDate)
            .order_by_asc(payment::Column::PaymentId)
            .all(&self.db)
            .await?
            .into_iter()
            .map(model_to_payment)
            .collect()
    }

    pub async fn count_payments_for_loan(&self, loan_id: &str) -> Result<u64> {
        Ok(payment::Entity::find()
            .filter(payment::Column::LoanId.eq(loan_id.to_string()))
            .count(&self.db)
            .await?)
    }
}
