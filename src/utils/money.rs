//! 卢比金额
//!
//! 数据库存储派萨（`i64`），存储层以上均使用 `Decimal` 卢比

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::{CrmError, Result};

pub const RUPEE: &str = "₹";

/// 按 Windows-1252 解码的 `₹`，常见于编码错误的表格文件
const RUPEE_MOJIBAKE: &str = "â‚¹";

/// 存储保留的小数位（派萨）
pub const MONEY_DP: u32 = 2;

/// 接受的最大卢比金额，保证所有派生值都在 `i64` 派萨范围内
pub const MAX_AMOUNT_RUPEES: i64 = 1_000_000_000_000;

/// 最大百分比（ROI、GST）
pub const MAX_PERCENT: i64 = 100_000;

/// 拒绝存储无法精确表示的金额：超过两位小数或超过 `MAX_AMOUNT_RUPEES`
pub fn check_money(amount: Decimal, field: &str) -> Result<Decimal> {
    check_scaled(amount, field, MAX_AMOUNT_RUPEES)
}

/// 与 `check_money` 规则相同，用于以基点存储的百分比
pub fn check_percent(percent: Decimal, field: &str) -> Result<Decimal> {
    check_scaled(percent, field, MAX_PERCENT)
}

fn check_scaled(value: Decimal, field: &str, max: i64) -> Result<Decimal> {
    if value.abs() > Decimal::from(max) {
        return Err(CrmError::validation(format!(
            "{} is out of range: {}",
            field, value
        )));
    }
    if value.normalize().scale() > MONEY_DP {
        return Err(CrmError::validation(format!(
            "{} has more than {} decimal places: {}",
            field, MONEY_DP, value
        )));
    }
    Ok(value)
}

pub fn to_minor(amount: Decimal) -> Result<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|v| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|v| v.to_i64())
        .ok_or_else(|| CrmError::validation(format!("Amount out of range: {}", amount)))
}

pub fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

pub fn percent_to_bps(percent: Decimal) -> Result<i64> {
    to_minor(percent)
}

pub fn bps_to_percent(bps: i64) -> Decimal {
    Decimal::new(bps, 2)
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// 解析用户输入的金额：`"₹1,25,000.50"`、`"125000.5"`、`" 500 "`
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let cleaned: String = raw
        .trim()
        .replace(RUPEE_MOJIBAKE, "")
        .replace(RUPEE, "")
        .replace("Rs.", "")
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(CrmError::validation("Amount is empty"));
    }
    Decimal::from_str(&cleaned)
        .map_err(|_| CrmError::validation(format!("Invalid amount: '{}'", raw.trim())))
}

/// 印度数字分组并带卢比符号：`₹1,25,000.50`
pub fn format_inr(amount: Decimal) -> String {
    let rounded = round_money(amount.abs());
    let text = format!("{:.2}", rounded);
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let grouped = if int_part.len() <= 3 {
        int_part.to_string()
    } else {
        let (head, tail) = int_part.split_at(int_part.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (h, t) = rest.split_at(rest.len() - 2);
            groups.push(t);
            rest = h;
        }
        groups.push(rest);
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };

    let sign = if amount.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}{}.{}", sign, RUPEE, grouped, frac_part)
}
