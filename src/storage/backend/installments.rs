//! 分期读写

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, sea_query::Expr,
};
use tracing::info;

use super::converters::{installment_to_active_model, model_to_installment};
use super::{CrmStorage, InstallmentFilter, retry};
use crate::errors::{CrmError, Result};
use crate::services::schedule::ScheduledInstallment;
use crate::storage::models::{Installment, InstallmentStatus};
use crate::utils::money::to_minor;

use migration::entities::installment;

fn installment_condition(filter: &InstallmentFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(ref loan_id) = filter.loan_id {
        condition = condition.add(installment::Column::LoanId.eq(loan_id.clone()));
    }
    if let Some(status) = filter.status {
        condition = condition.add(installment::Column::Status.eq(status.to_string()));
    }
    if let Some(from) = filter.due_from {
        condition = condition.add(installment::Column::DueDate.gte(from));
    }
    if let Some(to) = filter.due_to {
        condition = condition.add(installment::Column::DueDate.lte(to));
    }
    condition
}

fn outstanding_statuses() -> Vec<String> {
    [
        InstallmentStatus::Pending,
        InstallmentStatus::Overdue,
        InstallmentStatus::Bounced,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// 批量插入生成的还款计划，可在连接或事务上执行
pub(super) async fn insert_schedule<C: ConnectionTrait>(
    conn: &C,
    loan_id: &str,
    schedule: &[ScheduledInstallment],
    now: DateTime<Utc>,
) -> Result<()> {
    if schedule.is_empty() {
        return Ok(());
    }

    let rows = schedule
        .iter()
        .map(|item| {
            let number = i32::try_from(item.installment_number).map_err(|_| {
                CrmError::validation(format!(
                    "Installment number {} out of range",
                    item.installment_number
                ))
            })?;
            Ok(installment::ActiveModel {
                installment_id: NotSet,
                loan_id: Set(loan_id.to_string()),
                installment_number: Set(number),
                due_date: Set(item.due_date),
                amount: Set(to_minor(item.amount)?),
                status: Set(item.status.to_string()),
                paid_date: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    installment::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await
        .map_err(|e| {
            CrmError::database_operation(format!(
                "Failed to insert schedule for {}: {}",
                loan_id, e
            ))
        })?;
    Ok(())
}

impl CrmStorage {
    pub async fn get_installment(&self, installment_id: i64) -> Result<Option<Installment>> {
        let db = &self.db;
        let model = retry::with_retry(
            &format!("get_installment({})", installment_id),
            self.retry_config,
            || async { installment::Entity::find_by_id(installment_id).one(db).await },
        )
        .await?;
        model.map(model_to_installment).transpose()
    }

    /// 按期号排序的贷款还款计划
    pub async fn list_installments_for_loan(&self, loan_id: &str) -> Result<Vec<Installment>> {
        let db = &self.db;
        let id = loan_id.to_string();
        retry::with_retry("list_installments_for_loan", self.retry_config, || async {
            installment::Entity::find()
                .filter(installment::Column::LoanId.eq(id.clone()))
                .order_by_asc(installment::Column::InstallmentNumber)
                .all(db)
                .await
        })
        .await?
        .into_iter()
        .map(model_to_installment)
        .collect()
    }

    pub async fn list_installments(
        &self,
        filter: &InstallmentFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Installment>, u64)> {
        let db = &self.db;
        let condition = installment_condition(filter);

        let total = self
            .cached_count(format!("installments:{:?}", filter), || async {
                installment::Entity::find()
                    .filter(condition.clone())
                    .count(db)
                    .await
            })
            .await?;

        let models = retry::with_retry("list_installments", self.retry_config, || async {
            installment::Entity::find()
                .filter(condition.clone())
                .order_by_asc(installment::Column::DueDate)
                .order_by_asc(installment::Column::LoanId)
                .order_by_asc(installment::Column::InstallmentNumber)
                .paginate(db, page_size)
                .fetch_page(page.saturating_sub(1))
                .await
        })
        .await?;

        let items = models
            .into_iter()
            .map(model_to_installment)
            .collect::<Result<Vec<_>>>()?;
        Ok((items, total))
    }

    pub async fn update_installment(&self, item: &Installment) -> Result<Installment> {
        let am = installment_to_active_model(item)?;
        let model = am.update(&self.db).await.map_err(|e| {
            CrmError::database_operation(format!(
                "Failed to update installment {}: {}",
                item.installment_id, e
            ))
        })?;
        self.invalidate_count_cache();
        model_to_installment(model)
    }

    /// 贷款中 Pending、Overdue 或 Bounced 的分期
    pub async fn count_outstanding_installments(&self, loan_id: &str) -> Result<u64> {
        Ok(installment::Entity::find()
            .filter(installment::Column::LoanId.eq(loan_id.to_string()))
            .filter(installment::Column::Status.is_in(outstanding_statuses()))
            .count(&self.db)
            .await?)
    }

    pub async fn count_paid_installments(&self, loan_id: &str) -> Result<u64> {
        Ok(installment::Entity::find()
            .filter(installment::Column::LoanId.eq(loan_id.to_string()))
            .filter(installment::Column::Status.eq(InstallmentStatus::Paid.to_string()))
            .count(&self.db)
            .await?)
    }

    /// 到期日早于 `today` 的 Pending 分期标记为 Overdue，返回更新行数
    pub async fn mark_overdue(&self, today: NaiveDate) -> Result<u64> {
        let db = &self.db;
        let now = Utc::now();

        let result = retry::with_retry("mark_overdue", self.retry_config, || async {
            installment::Entity::update_many()
                .col_expr(
                    installment::Column::Status,
                    Expr::value(InstallmentStatus::Overdue.to_string()),
                )
                .col_expr(installment::Column::UpdatedAt, Expr::value(now))
                .filter(installment::Column::Status.eq(InstallmentStatus::Pending.to_string()))
                .filter(installment::Column::DueDate.lt(today))
                .exec(db)
                .await
        })
        .await?;

        if result.rows_affected > 0 {
            self.invalidate_count_cache();
            info!(
                "Marked {} installments overdue (due before {})",
                result.rows_affected, today
            );
        }
        Ok(result.rows_affected)
    }
}
