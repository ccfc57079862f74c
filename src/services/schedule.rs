//! 按周生成分期还款计划
//!
//! 纯计算，由调用方负责持久化

use chrono::{Days, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use ts_rs::TS;

use crate::api::services::crm::TS_EXPORT_PATH;
use crate::errors::{CrmError, Result};
use crate::storage::InstallmentStatus;
use crate::utils::money::MONEY_DP;

pub const DEFAULT_INSTALLMENT_COUNT: u32 = 14;
pub const DEFAULT_INTERVAL_DAYS: u32 = 7;

/// 舍入余数的处理方式
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RoundingPolicy {
    /// 每期都使用舍入后的金额，总额可能有偏差
    Uniform,
    /// 最后一期吸收余数
    #[default]
    ReconcileLast,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleParams {
    pub total: Decimal,
    pub disbursement_date: NaiveDate,
    pub count: u32,
    pub interval_days: u32,
    pub rounding_dp: u32,
    pub policy: RoundingPolicy,
}

impl ScheduleParams {
    /// 14 期周还款，整卢比，最后一期对账
    pub fn weekly(total: Decimal, disbursement_date: NaiveDate) -> Self {
        Self {
            total,
            disbursement_date,
            count: DEFAULT_INSTALLMENT_COUNT,
            interval_days: DEFAULT_INTERVAL_DAYS,
            rounding_dp: 0,
            policy: RoundingPolicy::ReconcileLast,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledInstallment {
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub status: InstallmentStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub requested_total: Decimal,
    /// 普通分期舍入后的金额
    pub installment_amount: Decimal,
    pub installments: Vec<ScheduledInstallment>,
}

impl Schedule {
    pub fn scheduled_total(&self) -> Decimal {
        self.installments.iter().map(|i| i.amount).sum()
    }

    /// `scheduled_total - requested_total`，`ReconcileLast` 下为零
    pub fn rounding_drift(&self) -> Decimal {
        self.scheduled_total() - self.requested_total
    }

    pub fn last_due_date(&self) -> Option<NaiveDate> {
        self.installments.last().map(|i| i.due_date)
    }
}

pub fn generate_schedule(params: &ScheduleParams) -> Result<Schedule> {
    if params.count == 0 {
        return Err(CrmError::validation(
            "Installment count must be at least 1",
        ));
    }
    if params.interval_days == 0 {
        return Err(CrmError::validation(
            "Installment interval must be at least 1 day",
        ));
    }
    if params.rounding_dp > MONEY_DP {
        return Err(CrmError::validation(format!(
            "Installments are stored in paise; rounding_dp {} exceeds {}",
            params.rounding_dp, MONEY_DP
        )));
    }
    if params.total <= Decimal::ZERO {
        return Err(CrmError::validation(format!(
            "Schedule total must be positive, got {}",
            params.total
        )));
    }

    let count = Decimal::from(params.count);
    let installment_amount = (params.total / count)
        .round_dp_with_strategy(params.rounding_dp, RoundingStrategy::MidpointAwayFromZero);

    let last_amount = match params.policy {
        RoundingPolicy::Uniform => installment_amount,
        RoundingPolicy::ReconcileLast => {
            let rest = installment_amount * Decimal::from(params.count - 1);
            let last = params.total - rest;
            if last <= Decimal::ZERO {
                return Err(CrmError::validation(format!(
                    "Rounding leaves a non-positive final installment ({}) for total {} over {} installments",
                    last, params.total, params.count
                )));
            }
            last
        }
    };

    if installment_amount <= Decimal::ZERO {
        return Err(CrmError::validation(format!(
            "Total {} is too small for {} installments",
            params.total, params.count
        )));
    }

    let mut installments = Vec::with_capacity(params.count as usize);
    for n in 1..=params.count {
        let offset = u64::from(params.interval_days) * u64::from(n);
        let due_date = params
            .disbursement_date
            .checked_add_days(Days::new(offset))
            .ok_or_else(|| {
                CrmError::validation(format!(
                    "Due date out of range for installment {}",
                    n
                ))
            })?;
        let amount = if n == params.count {
            last_amount
        } else {
            installment_amount
        };
        installments.push(ScheduledInstallment {
            installment_number: n,
            due_date,
            amount,
            status: InstallmentStatus::Pending,
        });
    }

    Ok(Schedule {
        requested_total: params.total,
        installment_amount,
        installments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekly_due_dates() {
        let schedule =
            generate_schedule(&ScheduleParams::weekly(dec!(14000), date(2024, 1, 1))).unwrap();
        assert_eq!(schedule.installments.len(), 14);
        assert_eq!(schedule.installments[0].due_date, date(2024, 1, 8));
        assert_eq!(schedule.installments[1].due_date, date(2024, 1, 15));
        assert_eq!(schedule.last_due_date(), Some(date(2024, 4, 8)));
        assert!(
            schedule
                .installments
                .iter()
                .all(|i| i.status == InstallmentStatus::Pending)
        );
        assert_eq!(
            schedule
                .installments
                .iter()
                .map(|i| i.installment_number)
                .collect::<Vec<_>>(),
            (1..=14).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_even_split_has_no_drift() {
        let schedule =
            generate_schedule(&ScheduleParams::weekly(dec!(14000), date(2024, 1, 1))).unwrap();
        assert!(schedule.installments.iter().all(|i| i.amount == dec!(1000)));
        assert_eq!(schedule.rounding_drift(), Decimal::ZERO);
    }

    #[test]
    fn test_reconcile_last_absorbs_remainder() {
        // 12000 / 14 = 857.14...
        let schedule =
            generate_schedule(&ScheduleParams::weekly(dec!(12000), date(2024, 1, 1))).unwrap();
        assert_eq!(schedule.installment_amount, dec!(857));
        assert_eq!(schedule.installments[12].amount, dec!(857));
        assert_eq!(schedule.installments[13].amount, dec!(859));
        assert_eq!(schedule.scheduled_total(), dec!(12000));
        assert_eq!(schedule.rounding_drift(), Decimal::ZERO);
    }

    #[test]
    fn test_uniform_reports_drift() {
        let params = ScheduleParams {
            policy: RoundingPolicy::Uniform,
            ..ScheduleParams::weekly(dec!(12000), date(2024, 1, 1))
        };
        let schedule = generate_schedule(&params).unwrap();
        assert!(schedule.installments.iter().all(|i| i.amount == dec!(857)));
        assert_eq!(schedule.scheduled_total(), dec!(11998));
        assert_eq!(schedule.rounding_drift(), dec!(-2));
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        // 7 / 2 = 3.5 -> 4
        let params = ScheduleParams {
            count: 2,
            policy: RoundingPolicy::Uniform,
            ..ScheduleParams::weekly(dec!(7), date(2024, 1, 1))
        };
        let schedule = generate_schedule(&params).unwrap();
        assert_eq!(schedule.installment_amount, dec!(4));
    }

    #[test]
    fn test_rounding_to_paise() {
        let params = ScheduleParams {
            rounding_dp: 2,
            ..ScheduleParams::weekly(dec!(10000), date(2024, 1, 1))
        };
        let schedule = generate_schedule(&params).unwrap();
        assert_eq!(schedule.installment_amount, dec!(714.29));
        assert_eq!(schedule.installments[13].amount, dec!(714.23));
        assert_eq!(schedule.scheduled_total(), dec!(10000));
    }

    #[test]
    fn test_custom_count_and_interval() {
        let params = ScheduleParams {
            count: 4,
            interval_days: 30,
            ..ScheduleParams::weekly(dec!(4000), date(2024, 1, 31))
        };
        let schedule = generate_schedule(&params).unwrap();
        assert_eq!(schedule.installments.len(), 4);
        assert_eq!(schedule.installments[0].due_date, date(2024, 3, 1));
        assert_eq!(schedule.installments[3].due_date, date(2024, 5, 30));
    }

    #[test]
    fn test_single_installment_is_the_total() {
        let params = ScheduleParams {
            count: 1,
            ..ScheduleParams::weekly(dec!(1234.56), date(2024, 1, 1))
        };
        let schedule = generate_schedule(&params).unwrap();
        assert_eq!(schedule.installments.len(), 1);
        assert_eq!(schedule.installments[0].amount, dec!(1234.56));
    }

    #[test]
    fn test_non_positive_last_installment_is_rejected() {
        // 10 / 14 每期舍入为 1，前 13 期已超过总额
        let params = ScheduleParams::weekly(dec!(10), date(2024, 1, 1));
        let err = generate_schedule(&params).unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
    }

    #[test]
    fn test_total_too_small_for_uniform() {
        let params = ScheduleParams {
            policy: RoundingPolicy::Uniform,
            ..ScheduleParams::weekly(dec!(3), date(2024, 1, 1))
        };
        assert!(generate_schedule(&params).is_err());
    }

    #[test]
    fn test_invalid_inputs() {
        let base = ScheduleParams::weekly(dec!(1000), date(2024, 1, 1));
        assert!(generate_schedule(&ScheduleParams { count: 0, ..base }).is_err());
        assert!(generate_schedule(&ScheduleParams { interval_days: 0, ..base }).is_err());
        assert!(generate_schedule(&ScheduleParams { total: dec!(0), ..base }).is_err());
        assert!(generate_schedule(&ScheduleParams { total: dec!(-5), ..base }).is_err());
    }

    #[test]
    fn test_rounding_finer_than_paise_is_rejected() {
        // 12000 / 14 保留 3 位小数时会存成 857.14，对账失效
        let params = ScheduleParams {
            rounding_dp: 3,
            ..ScheduleParams::weekly(dec!(12000), date(2024, 1, 1))
        };
        let err = generate_schedule(&params).unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
    }

    #[test]
    fn test_date_overflow_is_an_error() {
        let params = ScheduleParams {
            interval_days: u32::MAX,
            ..ScheduleParams::weekly(dec!(1000), NaiveDate::MAX)
        };
        assert!(generate_schedule(&params).is_err());
    }

    #[test]
    fn test_policy_parsing() {
        use std::str::FromStr;
        assert_eq!(
            RoundingPolicy::from_str("reconcile_last").unwrap(),
            RoundingPolicy::ReconcileLast
        );
        assert_eq!(RoundingPolicy::Uniform.to_string(), "uniform");
    }
}
