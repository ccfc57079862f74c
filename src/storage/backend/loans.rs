//! 贷款读写

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, sea_query::Expr,
};
use tracing::info;

use super::converters::{loan_to_active_model, model_to_loan};
use super::installments::insert_schedule;
use super::{CrmStorage, LoanFilter, retry};
use crate::errors::{CrmError, Result};
use crate::services::schedule::ScheduledInstallment;
use crate::storage::models::{InstallmentStatus, Loan, LoanStats, LoanStatus};
use crate::utils::money::from_minor;

use migration::entities::{installment, loan, payment};

fn loan_condition(filter: &LoanFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(status) = filter.status {
        condition = condition.add(loan::Column::Status.eq(status.to_string()));
    }
    if let Some(ref branch) = filter.branch {
        condition = condition.add(loan::Column::Branch.eq(branch.clone()));
    }
    if let Some(ref search) = filter.search {
        condition = condition.add(
            Condition::any()
                .add(loan::Column::LoanId.contains(search))
                .add(loan::Column::CustomerName.contains(search)),
        );
    }
    if let Some(from) = filter.disbursed_from {
        condition = condition.add(loan::Column::DateOfDisbursement.gte(from));
    }
    if let Some(to) = filter.disbursed_to {
        condition = condition.add(loan::Column::DateOfDisbursement.lte(to));
    }
    if let Some(client_id) = filter.client_id {
        condition = condition.add(loan::Column::ClientId.eq(client_id));
    }
    condition
}

impl CrmStorage {
    pub async fn get_loan(&self, loan_id: &str) -> Result<Option<Loan>> {
        let db = &self.db;
        let id = loan_id.to_string();

        let model = retry::with_retry(&format!("get_loan({})", loan_id), self.retry_config, || async {
            loan::Entity::find_by_id(id.clone()).one(db).await
        })
        .await?;

        model.map(model_to_loan).transpose()
    }

    pub async fn loan_exists(&self, loan_id: &str) -> Result<bool> {
        let count = loan::Entity::find_by_id(loan_id.to_string())
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// 在同一事务中写入贷款及其还款计划
    pub async fn insert_loan_with_schedule(
        &self,
        loan: &Loan,
        schedule: &[ScheduledInstallment],
    ) -> Result<()> {
        let am = loan_to_active_model(loan)?;
        let txn = self.db.begin().await?;

        loan::Entity::insert(am)
            .exec_without_returning(&txn)
            .await
            .map_err(|e| CrmError::insert_failed(e, format!("Loan {}", loan.loan_id)))?;
        insert_schedule(&txn, &loan.loan_id, schedule, loan.created_at).await?;

        txn.commit().await?;
        self.invalidate_count_cache();
        info!(
            "Loan {} created with {} installments",
            loan.loan_id,
            schedule.len()
        );
        Ok(())
    }

    /// 更新贷款记录，提供还款计划时整体替换
    pub async fn update_loan(
        &self,
        loan: &Loan,
        new_schedule: Option<&[ScheduledInstallment]>,
    ) -> Result<()> {
        let am = loan_to_active_model(loan)?;
        let txn = self.db.begin().await?;

        am.update(&txn).await.map_err(|e| {
            CrmError::database_operation(format!("Failed to update loan {}: {}", loan.loan_id, e))
        })?;

        if let Some(schedule) = new_schedule {
            installment::Entity::delete_many()
                .filter(installment::Column::LoanId.eq(loan.loan_id.clone()))
                .exec(&txn)
                .await?;
            insert_schedule(&txn, &loan.loan_id, schedule, loan.updated_at).await?;
        }

        txn.commit().await?;
        self.invalidate_count_cache();
        Ok(())
    }

    pub async fn set_loan_status(
        &self,
        loan_id: &str,
        status: LoanStatus,
        closed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let db = &self.db;
        let now = Utc::now();
        let id = loan_id.to_string();

        let result = retry::with_retry(
            &format!("set_loan_status({})", loan_id),
            self.retry_config,
            || async {
                loan::Entity::update_many()
                    .col_expr(loan::Column::Status, Expr::value(status.to_string()))
                    .col_expr(loan::Column::ClosedAt, Expr::value(closed_at))
                    .col_expr(loan::Column::UpdatedAt, Expr::value(now))
                    .filter(loan::Column::LoanId.eq(id.clone()))
                    .exec(db)
                    .await
            },
        )
        .await?;

        if result.rows_affected == 0 {
            return Err(CrmError::not_found(format!("Loan {} not found", loan_id)));
        }
        self.invalidate_count_cache();
        Ok(())
    }

    pub async fn list_loans(
        &self,
        filter: &LoanFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Loan>, u64)> {
        let db = &self.db;
        let condition = loan_condition(filter);
        let cache_key = format!("loans:{:?}", filter);

        let total = self
            .cached_count(cache_key, || async {
                loan::Entity::find()
                    .filter(condition.clone())
                    .count(db)
                    .await
            })
            .await?;

        let models = retry::with_retry("list_loans", self.retry_config, || async {
            loan::Entity::find()
                .filter(condition.clone())
                .order_by_desc(loan::Column::DateOfDisbursement)
                .order_by_desc(loan::Column::CreatedAt)
                .paginate(db, page_size)
                .fetch_page(page.saturating_sub(1))
                .await
        })
        .await?;

        let loans = models
            .into_iter()
            .map(model_to_loan)
            .collect::<Result<Vec<_>>>()?;
        Ok((loans, total))
    }

    /// 所有匹配的贷款，按放款日期升序（用于导出）
    pub async fn list_all_loans(&self, filter: &LoanFilter) -> Result<Vec<Loan>> {
        loan::Entity::find()
            .filter(loan_condition(filter))
            .order_by_asc(loan::Column::DateOfDisbursement)
            .order_by_asc(loan::Column::LoanId)
            .all(&self.db)
            .await?
            .into_iter()
            .map(model_to_loan)
            .collect()
    }

    pub async fn loan_stats(&self) -> Result<LoanStats> {
        let db = &self.db;

        let by_status: Vec<(String, i64)> = loan::Entity::find()
            .select_only()
            .column(loan::Column::Status)
            .column_as(loan::Column::LoanId.count(), "count")
            .group_by(loan::Column::Status)
            .into_tuple()
            .all(db)
            .await?;

        let mut stats = LoanStats::default();
        for (status, count) in by_status {
            let count = count.max(0) as u64;
            stats.total_loans += count;
            match status.parse::<LoanStatus>() {
                Ok(LoanStatus::Active) => stats.active += count,
                Ok(LoanStatus::Closed) => stats.closed += count,
                Ok(LoanStatus::Foreclosed) => stats.foreclosed += count,
                Ok(LoanStatus::Default) => stats.defaulted += count,
                Err(_) => {}
            }
        }

        // 在 Rust 中求和：各数据库 SUM(bigint) 的解码类型不同
        let amounts: Vec<(i64, i64)> = loan::Entity::find()
            .select_only()
            .column(loan::Column::LoanAmount)
            .column(loan::Column::RepaymentAmount)
            .into_tuple()
            .all(db)
            .await?;
        let (disbursed, repayment) = amounts
            .iter()
            .fold((0i64, 0i64), |(d, r), (a, b)| (d.saturating_add(*a), r.saturating_add(*b)));
        stats.total_disbursed = from_minor(disbursed);
        stats.total_repayment = from_minor(repayment);

        let collected: Vec<i64> = payment::Entity::find()
            .select_only()
            .column(payment::Column::Amount)
            .into_tuple()
            .all(db)
            .await?;
        stats.total_collected = from_minor(collected.iter().fold(0i64, |acc, v| acc.saturating_add(*v)));

        stats.overdue_installments = installment::Entity::find()
            .filter(installment::Column::Status.eq(InstallmentStatus::Overdue.to_string()))
            .count(db)
            .await?;

        Ok(stats)
    }
}
