//! 还款、分期修正与逾期扫描测试

mod common;

use rust_decimal_macros::dec;

use common::{date, loan_request, test_env};
use loan_crm::errors::CrmError;
use loan_crm::services::{
    GenerateInstallmentsRequest, IssueNocRequest, RecordPaymentRequest, UpdateInstallmentRequest,
};
use loan_crm::storage::{Installment, InstallmentStatus, LoanStatus, PaymentFilter, PaymentMethod};

fn cash(loan_id: &str, item: &Installment, amount: rust_decimal::Decimal) -> RecordPaymentRequest {
    RecordPaymentRequest {
        loan_id: loan_id.to_string(),
        installment_id: item.installment_id,
        amount,
        method: PaymentMethod::Cash,
        payment_date: Some(item.due_date),
        remarks: Some("  collected at branch ".to_string()),
        utr: None,
    }
}

#[tokio::test]
async fn test_payment_settles_installment() {
    let env = test_env().await;
    env.services
        .loans
        .create_loan(loan_request("LN-PAY"))
        .await
        .unwrap();
    let schedule = env
        .services
        .installments
        .list_for_loan("LN-PAY")
        .await
        .unwrap();

    let receipt = env
        .services
        .payments
        .record_payment(cash("LN-PAY", &schedule[0], dec!(857)), "asha")
        .await
        .unwrap();
    assert_eq!(receipt.installment.status, InstallmentStatus::Paid);
    assert_eq!(receipt.installment.paid_date, Some(date(2024, 1, 8)));
    assert_eq!(receipt.payment.recorded_by, "asha");
    assert_eq!(receipt.payment.remarks.as_deref(), Some("collected at branch"));
    assert_eq!(receipt.shortfall, None);

    let (payments, total) = env
        .services
        .payments
        .list_payments(
            &PaymentFilter {
                loan_id: Some("LN-PAY".to_string()),
                ..PaymentFilter::default()
            },
            1,
            20,
        )
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(payments[0].amount, dec!(857));

    // 同一分期的第二笔还款应被拒绝
    let err = env
        .services
        .payments
        .record_payment(cash("LN-PAY", &schedule[0], dec!(857)), "asha")
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Conflict(_)));
}

#[tokio::test]
async fn test_under_payment_is_accepted_with_shortfall() {
    let env = test_env().await;
    env.services
        .loans
        .create_loan(loan_request("LN-SHORT"))
        .await
        .unwrap();
    let schedule = env
        .services
        .installments
        .list_for_loan("LN-SHORT")
        .await
        .unwrap();

    let receipt = env
        .services
        .payments
        .record_payment(cash("LN-SHORT", &schedule[1], dec!(800)), "asha")
        .await
        .unwrap();
    assert_eq!(receipt.shortfall, Some(dec!(57)));
    assert_eq!(receipt.installment.status, InstallmentStatus::Paid);
}

#[tokio::test]
async fn test_payment_validation() {
    let env = test_env().await;
    env.services
        .loans
        .create_loan(loan_request("LN-VAL"))
        .await
        .unwrap();
    env.services
        .loans
        .create_loan(loan_request("LN-OTHER"))
        .await
        .unwrap();
    let schedule = env
        .services
        .installments
        .list_for_loan("LN-VAL")
        .await
        .unwrap();

    let mut upi = cash("LN-VAL", &schedule[0], dec!(857));
    upi.method = PaymentMethod::Upi;
    let err = env
        .services
        .payments
        .record_payment(upi.clone(), "asha")
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));
    upi.utr = Some("UTR123456".to_string());
    let receipt = env
        .services
        .payments
        .record_payment(upi, "asha")
        .await
        .unwrap();
    assert_eq!(receipt.payment.utr.as_deref(), Some("UTR123456"));

    let err = env
        .services
        .payments
        .record_payment(cash("LN-VAL", &schedule[1], dec!(0)), "asha")
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));

    let err = env
        .services
        .payments
        .record_payment(cash("LN-OTHER", &schedule[1], dec!(857)), "asha")
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));
}

#[tokio::test]
async fn test_closed_loan_rejects_payments() {
    let env = test_env().await;
    env.services
        .loans
        .create_loan(loan_request("LN-SHUT"))
        .await
        .unwrap();
    let schedule = env
        .services
        .installments
        .list_for_loan("LN-SHUT")
        .await
        .unwrap();
    env.services
        .loans
        .update_status("LN-SHUT", LoanStatus::Foreclosed, false)
        .await
        .unwrap();

    let err = env
        .services
        .payments
        .record_payment(cash("LN-SHUT", &schedule[0], dec!(857)), "asha")
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::InvalidState(_)));
}

#[tokio::test]
async fn test_paid_installment_is_immutable_and_schedule_locked() {
    let env = test_env().await;
    env.services
        .loans
        .create_loan(loan_request("LN-LOCK"))
        .await
        .unwrap();
    let schedule = env
        .services
        .installments
        .list_for_loan("LN-LOCK")
        .await
        .unwrap();
    env.services
        .payments
        .record_payment(cash("LN-LOCK", &schedule[0], dec!(857)), "asha")
        .await
        .unwrap();

    let err = env
        .services
        .installments
        .update_installment(
            schedule[0].installment_id,
            UpdateInstallmentRequest {
                amount: Some(dec!(100)),
                ..UpdateInstallmentRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::InvalidState(_)));

    // 未还分期仍可修正
    let moved = env
        .services
        .installments
        .update_installment(
            schedule[1].installment_id,
            UpdateInstallmentRequest {
                due_date: Some(date(2024, 1, 20)),
                ..UpdateInstallmentRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.due_date, date(2024, 1, 20));

    let err = env
        .services
        .installments
        .generate(GenerateInstallmentsRequest {
            loan_id: "LN-LOCK".to_string(),
            replace: true,
            total_installments: Some(7),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::InvalidState(_)));
}

#[tokio::test]
async fn test_regenerate_requires_replace() {
    let env = test_env().await;
    env.services
        .loans
        .create_loan(loan_request("LN-REGEN"))
        .await
        .unwrap();

    let req = |replace| GenerateInstallmentsRequest {
        loan_id: "LN-REGEN".to_string(),
        replace,
        total_installments: Some(12),
    };
    let err = env
        .services
        .installments
        .generate(req(false))
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Conflict(_)));

    let schedule = env.services.installments.generate(req(true)).await.unwrap();
    assert_eq!(schedule.len(), 12);
    assert!(schedule.iter().all(|i| i.amount == dec!(1000)));
    let loan = env.services.loans.get_loan("LN-REGEN").await.unwrap();
    assert_eq!(loan.total_installments, 12);
    assert_eq!(loan.tenure_days, 84);
}

#[tokio::test]
async fn test_sub_paise_amounts_are_rejected() {
    let env = test_env().await;
    env.services
        .loans
        .create_loan(loan_request("LN-PAISE"))
        .await
        .unwrap();
    let schedule = env
        .services
        .installments
        .list_for_loan("LN-PAISE")
        .await
        .unwrap();

    let err = env
        .services
        .payments
        .record_payment(cash("LN-PAISE", &schedule[0], dec!(857.005)), "asha")
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));

    let err = env
        .services
        .installments
        .update_installment(
            schedule[1].installment_id,
            UpdateInstallmentRequest {
                amount: Some(dec!(900.125)),
                ..UpdateInstallmentRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));

    let untouched = env
        .services
        .installments
        .get_installment(schedule[1].installment_id)
        .await
        .unwrap();
    assert_eq!(untouched.amount, dec!(857));
    assert_eq!(untouched.status, InstallmentStatus::Pending);
}

#[tokio::test]
async fn test_overdue_sweep_marks_only_pending_past_due() {
    let env = test_env().await;
    env.services
        .loans
        .create_loan(loan_request("LN-LATE"))
        .await
        .unwrap();
    let schedule = env
        .services
        .installments
        .list_for_loan("LN-LATE")
        .await
        .unwrap();
    env.services
        .payments
        .record_payment(cash("LN-LATE", &schedule[0], dec!(857)), "asha")
        .await
        .unwrap();

    // 到期日 2024-01-08 .. 2024-04-08，其中三期早于 1 月 25 日
    let marked = env
        .services
        .installments
        .mark_overdue(date(2024, 1, 25))
        .await
        .unwrap();
    assert_eq!(marked, 2);

    let schedule = env
        .services
        .installments
        .list_for_loan("LN-LATE")
        .await
        .unwrap();
    assert_eq!(schedule[0].status, InstallmentStatus::Paid);
    assert_eq!(schedule[1].status, InstallmentStatus::Overdue);
    assert_eq!(schedule[2].status, InstallmentStatus::Overdue);
    assert_eq!(schedule[3].status, InstallmentStatus::Pending);

    // 再次执行不应有变化
    let marked = env
        .services
        .installments
        .mark_overdue(date(2024, 1, 25))
        .await
        .unwrap();
    assert_eq!(marked, 0);
}

#[tokio::test]
async fn test_noc_after_closure() {
    let env = test_env().await;
    let mut req = loan_request("LN-NOC");
    req.total_installments = Some(2);
    env.services.loans.create_loan(req).await.unwrap();

    let err = env
        .services
        .nocs
        .issue_noc("LN-NOC", IssueNocRequest::default(), "Manager")
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::InvalidState(_)));

    let schedule = env
        .services
        .installments
        .list_for_loan("LN-NOC")
        .await
        .unwrap();
    for item in &schedule {
        env.services
            .payments
            .record_payment(cash("LN-NOC", item, item.amount), "asha")
            .await
            .unwrap();
    }
    env.services
        .loans
        .update_status("LN-NOC", LoanStatus::Closed, false)
        .await
        .unwrap();

    let doc = env
        .services
        .nocs
        .issue_noc(
            "LN-NOC",
            IssueNocRequest {
                note: Some("Original documents returned".to_string()),
            },
            "Manager",
        )
        .await
        .unwrap();
    assert!(doc.noc.reference_no.starts_with("NOC-"));
    assert!(doc.text.contains("Ravi Kumar"));
    assert!(doc.text.contains("LN-NOC"));
    assert!(doc.text.contains("Original documents returned"));

    let fetched = env.services.nocs.get_noc("LN-NOC").await.unwrap();
    assert_eq!(fetched.noc.reference_no, doc.noc.reference_no);

    let err = env
        .services
        .nocs
        .issue_noc("LN-NOC", IssueNocRequest::default(), "Manager")
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Conflict(_)));
}
