//! 基于真实 SQLite 数据库的 LoanService 测试

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::{date, loan_request, test_env, test_env_with_policy};
use loan_crm::errors::CrmError;
use loan_crm::services::{
    ImportMode, LoanPolicy, RecordPaymentRequest, UpdateLoanRequest,
};
use loan_crm::storage::{InstallmentStatus, LoanStatus, PaymentMethod};
use loan_crm::utils::csv_handler::read_loan_rows;

#[tokio::test]
async fn test_create_loan_derives_terms_and_schedule() {
    let env = test_env().await;
    let result = env
        .services
        .loans
        .create_loan(loan_request("LN-001"))
        .await
        .unwrap();

    let loan = &result.loan;
    assert!(!result.generated_id);
    assert_eq!(result.installments_created, 14);
    assert_eq!(loan.gst, dec!(90));
    assert_eq!(loan.net_disbursement, dec!(9410));
    assert_eq!(loan.repayment_amount, dec!(12000));
    assert_eq!(loan.interest_earned, dec!(2000));
    assert_eq!(loan.tenure_days, 98);
    assert_eq!(loan.installment_amount, dec!(857));
    assert_eq!(loan.status, LoanStatus::Active);

    let schedule = env
        .services
        .installments
        .list_for_loan("LN-001")
        .await
        .unwrap();
    assert_eq!(schedule.len(), 14);
    assert_eq!(schedule[0].due_date, date(2024, 1, 8));
    assert_eq!(schedule[13].due_date, date(2024, 4, 8));
    assert_eq!(schedule[13].amount, dec!(859));
    let total: Decimal = schedule.iter().map(|i| i.amount).sum();
    assert_eq!(total, loan.repayment_amount);
    assert!(schedule.iter().all(|i| i.status == InstallmentStatus::Pending));
}

#[tokio::test]
async fn test_repayment_amount_wins_over_roi() {
    let env = test_env().await;
    let mut req = loan_request("LN-002");
    req.repayment_amount = Some(dec!(11500));
    req.roi = Some(dec!(40));

    let loan = env.services.loans.create_loan(req).await.unwrap().loan;
    assert_eq!(loan.repayment_amount, dec!(11500));
    assert_eq!(loan.roi, dec!(15));
}

#[tokio::test]
async fn test_generated_loan_id_and_duplicates() {
    let env = test_env().await;
    let mut req = loan_request("");
    req.loan_id = None;
    let created = env.services.loans.create_loan(req).await.unwrap();
    assert!(created.generated_id);
    assert!(created.loan.loan_id.starts_with("LN"));

    env.services
        .loans
        .create_loan(loan_request("DUP-1"))
        .await
        .unwrap();
    let err = env
        .services
        .loans
        .create_loan(loan_request("DUP-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Conflict(_)));

    let err = env
        .services
        .loans
        .create_loan(loan_request("bad id!"))
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));
}

#[tokio::test]
async fn test_create_without_schedule() {
    let env = test_env().await;
    let mut req = loan_request("LN-NOSCHED");
    req.generate_schedule = false;
    let result = env.services.loans.create_loan(req).await.unwrap();
    assert_eq!(result.installments_created, 0);

    // 之后生成计划使用贷款自身的条款
    let generated = env
        .services
        .installments
        .generate(loan_crm::services::GenerateInstallmentsRequest {
            loan_id: "LN-NOSCHED".to_string(),
            replace: false,
            total_installments: None,
        })
        .await
        .unwrap();
    assert_eq!(generated.len(), 14);
}

#[tokio::test]
async fn test_edit_regenerates_schedule_until_a_payment_exists() {
    let env = test_env().await;
    env.services
        .loans
        .create_loan(loan_request("LN-EDIT"))
        .await
        .unwrap();

    let edited = env
        .services
        .loans
        .edit_loan(
            "LN-EDIT",
            UpdateLoanRequest {
                total_installments: Some(10),
                ..UpdateLoanRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.total_installments, 10);
    assert_eq!(edited.tenure_days, 70);
    assert_eq!(edited.installment_amount, dec!(1200));
    let schedule = env
        .services
        .installments
        .list_for_loan("LN-EDIT")
        .await
        .unwrap();
    assert_eq!(schedule.len(), 10);

    env.services
        .payments
        .record_payment(
            RecordPaymentRequest {
                loan_id: "LN-EDIT".to_string(),
                installment_id: schedule[0].installment_id,
                amount: dec!(1200),
                method: PaymentMethod::Cash,
                payment_date: Some(date(2024, 1, 8)),
                remarks: None,
                utr: None,
            },
            "collector",
        )
        .await
        .unwrap();

    let err = env
        .services
        .loans
        .edit_loan(
            "LN-EDIT",
            UpdateLoanRequest {
                loan_amount: Some(dec!(20000)),
                ..UpdateLoanRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::InvalidState(_)));

    // 非金额字段仍可编辑
    let renamed = env
        .services
        .loans
        .edit_loan(
            "LN-EDIT",
            UpdateLoanRequest {
                customer_name: Some("Ravi K.".to_string()),
                ..UpdateLoanRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.customer_name, "Ravi K.");
}

#[tokio::test]
async fn test_close_needs_force_with_unpaid_installments() {
    let env = test_env().await;
    env.services
        .loans
        .create_loan(loan_request("LN-CLOSE"))
        .await
        .unwrap();

    let err = env
        .services
        .loans
        .update_status("LN-CLOSE", LoanStatus::Closed, false)
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::InvalidState(_)));

    let closed = env
        .services
        .loans
        .update_status("LN-CLOSE", LoanStatus::Closed, true)
        .await
        .unwrap();
    assert_eq!(closed.status, LoanStatus::Closed);
    assert!(closed.closed_at.is_some());

    // 终态不能重新打开
    let err = env
        .services
        .loans
        .update_status("LN-CLOSE", LoanStatus::Active, true)
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::InvalidState(_)));
}

#[tokio::test]
async fn test_lenient_policy_closes_without_force() {
    let policy = LoanPolicy {
        strict_close: false,
        ..LoanPolicy::default()
    };
    let env = test_env_with_policy(policy).await;
    env.services
        .loans
        .create_loan(loan_request("LN-LENIENT"))
        .await
        .unwrap();
    let closed = env
        .services
        .loans
        .update_status("LN-LENIENT", LoanStatus::Closed, false)
        .await
        .unwrap();
    assert_eq!(closed.status, LoanStatus::Closed);
}

#[tokio::test]
async fn test_bulk_close_reports_each_loan() {
    let env = test_env().await;
    let mut req = loan_request("LN-B1");
    req.generate_schedule = false;
    env.services.loans.create_loan(req).await.unwrap();
    env.services
        .loans
        .create_loan(loan_request("LN-B2"))
        .await
        .unwrap();

    let ids = vec![
        "LN-B1".to_string(),
        "LN-B2".to_string(),
        "LN-MISSING".to_string(),
    ];
    let result = env.services.loans.bulk_close(&ids, false).await;
    assert_eq!(result.success, vec!["LN-B1".to_string()]);
    assert_eq!(result.failed.len(), 2);
    assert!(result.failed.iter().any(|f| f.key == "LN-MISSING"));

    let stats = env.services.loans.stats().await.unwrap();
    assert_eq!(stats.total_loans, 2);
    assert_eq!(stats.closed, 1);
    assert_eq!(stats.active, 1);
}

#[tokio::test]
async fn test_import_modes() {
    let env = test_env().await;
    env.services
        .loans
        .create_loan(loan_request("LN-IMP1"))
        .await
        .unwrap();

    let csv = "\
loan_id,customer_name,branch,loan_amount,processing_fee,roi,date_of_disbursement
LN-IMP1,Changed Name,Pune,10000,500,20,2024-01-01
LN-IMP2,Sita Devi,Satara,\u{20b9}5000,250,20,15/01/2024
LN-IMP3,,Satara,5000,250,20,2024-01-15
";

    let rows = read_loan_rows(csv.as_bytes()).unwrap();
    let result = env.services.loans.import_loans(rows, ImportMode::Skip).await;
    assert_eq!(result.total_rows, 3);
    assert_eq!(result.success_count, 1);
    assert_eq!(result.skipped_count, 1);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.failed_items[0].row, 3);
    assert_eq!(result.failed_items[0].key, "LN-IMP3");

    let imported = env.services.loans.get_loan("LN-IMP2").await.unwrap();
    assert_eq!(imported.loan_amount, dec!(5000));
    assert_eq!(imported.date_of_disbursement, date(2024, 1, 15));

    let rows = read_loan_rows(csv.as_bytes()).unwrap();
    let result = env.services.loans.import_loans(rows, ImportMode::Error).await;
    assert_eq!(result.success_count, 0);
    assert_eq!(result.failed_count, 3);

    let rows = read_loan_rows(csv.as_bytes()).unwrap();
    let result = env
        .services
        .loans
        .import_loans(rows, ImportMode::Overwrite)
        .await;
    assert_eq!(result.success_count, 2);
    let overwritten = env.services.loans.get_loan("LN-IMP1").await.unwrap();
    assert_eq!(overwritten.customer_name, "Changed Name");
}

#[tokio::test]
async fn test_sub_paise_loan_amount_is_rejected() {
    let env = test_env().await;
    let mut req = loan_request("LN-PAISE");
    req.loan_amount = dec!(1000.005);
    let err = env.services.loans.create_loan(req).await.unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));
    assert!(!env.storage.loan_exists("LN-PAISE").await.unwrap());

    // 派萨精度经过存储后保持不变
    let mut req = loan_request("LN-PAISE");
    req.loan_amount = dec!(10000.50);
    let created = env.services.loans.create_loan(req).await.unwrap();
    let stored = env.services.loans.get_loan("LN-PAISE").await.unwrap();
    assert_eq!(created.loan.loan_amount, stored.loan_amount);
    assert_eq!(created.loan.repayment_amount, stored.repayment_amount);
}

#[tokio::test]
async fn test_out_of_range_amounts_fail_per_row() {
    let env = test_env().await;
    let mut req = loan_request("LN-HUGE");
    req.loan_amount = Decimal::ONE;
    req.processing_fee = Decimal::ZERO;
    req.roi = None;
    req.repayment_amount = Some(Decimal::MAX);
    let err = env.services.loans.create_loan(req).await.unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));

    let csv = "\
loan_id,customer_name,branch,loan_amount,processing_fee,repayment_amount,date_of_disbursement
LN-ROW1,Asha Patil,Pune,10000,500,12000,2024-01-01
LN-ROW2,Ravi Kumar,Pune,1,0,79228162514264337593543950335,2024-01-01
LN-ROW3,Sita Devi,Satara,5000,250,6000,2024-01-01
";
    let rows = read_loan_rows(csv.as_bytes()).unwrap();
    let result = env.services.loans.import_loans(rows, ImportMode::Skip).await;
    assert_eq!(result.total_rows, 3);
    assert_eq!(result.success_count, 2);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.failed_items[0].key, "LN-ROW2");
    assert!(env.storage.loan_exists("LN-ROW3").await.unwrap());
    assert!(!env.storage.loan_exists("LN-ROW2").await.unwrap());
}

#[tokio::test]
async fn test_duplicate_keys_at_storage_are_conflicts() {
    let env = test_env().await;
    env.services
        .loans
        .create_loan(loan_request("LN-DUPKEY"))
        .await
        .unwrap();

    // 模拟绕过存在性检查的并发写入
    let loan = env.services.loans.get_loan("LN-DUPKEY").await.unwrap();
    let err = env
        .storage
        .insert_loan_with_schedule(&loan, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Conflict(_)));

    env.services
        .loans
        .update_status("LN-DUPKEY", LoanStatus::Closed, true)
        .await
        .unwrap();
    let doc = env
        .services
        .nocs
        .issue_noc("LN-DUPKEY", Default::default(), "Manager")
        .await
        .unwrap();
    let mut second = doc.noc.clone();
    second.reference_no = "NOC-20240101-RACE01".to_string();
    let err = env.storage.insert_noc(&second).await.unwrap_err();
    assert!(matches!(err, CrmError::Conflict(_)));
}
