//! 还款计划、贷款条款与 CSV 导入基准测试

use std::io::Cursor;

use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rust_decimal::Decimal;
use std::hint::black_box;

use loan_crm::services::schedule::{RoundingPolicy, ScheduleParams, generate_schedule};
use loan_crm::services::{LoanPolicy, TermsInput, derive_terms};
use loan_crm::utils::csv_handler::read_loan_rows;

fn disbursed() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn bench_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule/generate");

    for count in [14u32, 52, 365] {
        let params = ScheduleParams {
            count,
            ..ScheduleParams::weekly(Decimal::new(1_234_567, 2), disbursed())
        };
        group.bench_with_input(BenchmarkId::new("reconcile_last", count), &params, |b, p| {
            b.iter(|| generate_schedule(black_box(p)).unwrap())
        });

        let uniform = ScheduleParams {
            policy: RoundingPolicy::Uniform,
            ..params
        };
        group.bench_with_input(BenchmarkId::new("uniform", count), &uniform, |b, p| {
            b.iter(|| generate_schedule(black_box(p)).unwrap())
        });
    }
    group.finish();
}

fn bench_derive_terms(c: &mut Criterion) {
    let policy = LoanPolicy::default();
    let input = TermsInput {
        loan_amount: Decimal::from(10_000),
        processing_fee: Decimal::from(500),
        gst: None,
        roi: Some(Decimal::from(20)),
        repayment_amount: None,
        total_installments: None,
        tenure_days: None,
    };

    c.bench_function("loan/derive_terms", |b| {
        b.iter(|| derive_terms(black_box(&input), &policy).unwrap())
    });
}

fn bench_csv_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv/read_loan_rows");

    for size in [100usize, 1000] {
        let mut csv = String::from(
            "loan_id,customer_name,branch,loan_amount,processing_fee,roi,date_of_disbursement\n",
        );
        for i in 0..size {
            csv.push_str(&format!(
                "LN-{:05},Customer {},Pune,\"₹10,000\",500,20,01/01/2024\n",
                i, i
            ));
        }
        let bytes = csv.into_bytes();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, data| {
            b.iter(|| read_loan_rows(Cursor::new(black_box(data.as_slice()))).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_schedule, bench_derive_terms, bench_csv_import);
criterion_main!(benches);
