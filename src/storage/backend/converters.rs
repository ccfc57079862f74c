//! sea-orm 模型与领域记录之间的转换

use std::str::FromStr;

use sea_orm::ActiveValue::{NotSet, Set};

use crate::errors::{CrmError, Result};
use crate::storage::models::{Client, Installment, Lead, Loan, Noc, Payment, User};
use crate::utils::money::{bps_to_percent, from_minor, percent_to_bps, to_minor};

use migration::entities::{client, installment, lead, loan, noc, payment, user};

fn parse_enum<T: FromStr>(raw: &str, what: &str) -> Result<T> {
    T::from_str(raw)
        .map_err(|_| CrmError::database_operation(format!("Unknown {} '{}' in database", what, raw)))
}

pub fn model_to_loan(model: loan::Model) -> Result<Loan> {
    Ok(Loan {
        status: parse_enum(&model.status, "loan status")?,
        loan_id: model.loan_id,
        client_id: model.client_id,
        customer_name: model.customer_name,
        branch: model.branch,
        sourced_by: model.sourced_by,
        loan_amount: from_minor(model.loan_amount),
        processing_fee: from_minor(model.processing_fee),
        gst: from_minor(model.gst),
        net_disbursement: from_minor(model.net_disbursement),
        repayment_amount: from_minor(model.repayment_amount),
        interest_earned: from_minor(model.interest_earned),
        roi: bps_to_percent(model.roi_bps),
        tenure_days: model.tenure_days,
        date_of_disbursement: model.date_of_disbursement,
        installment_amount: from_minor(model.installment_amount),
        total_installments: model.total_installments,
        created_at: model.created_at,
        updated_at: model.updated_at,
        closed_at: model.closed_at,
    })
}

pub fn loan_to_active_model(loan: &Loan) -> Result<loan::ActiveModel> {
    Ok(loan::ActiveModel {
        loan_id: Set(loan.loan_id.clone()),
        client_id: Set(loan.client_id),
        customer_name: Set(loan.customer_name.clone()),
        branch: Set(loan.branch.clone()),
        sourced_by: Set(loan.sourced_by.clone()),
        loan_amount: Set(to_minor(loan.loan_amount)?),
        processing_fee: Set(to_minor(loan.processing_fee)?),
        gst: Set(to_minor(loan.gst)?),
        net_disbursement: Set(to_minor(loan.net_disbursement)?),
        repayment_amount: Set(to_minor(loan.repayment_amount)?),
        interest_earned: Set(to_minor(loan.interest_earned)?),
        roi_bps: Set(percent_to_bps(loan.roi)?),
        tenure_days: Set(loan.tenure_days),
        date_of_disbursement: Set(loan.date_of_disbursement),
        installment_amount: Set(to_minor(loan.installment_amount)?),
        total_installments: Set(loan.total_installments),
        status: Set(loan.status.to_string()),
        created_at: Set(loan.created_at),
        updated_at: Set(loan.updated_at),
        closed_at: Set(loan.closed_at),
    })
}

pub fn model_to_installment(model: installment::Model) -> Result<Installment> {
    Ok(Installment {
        status: parse_enum(&model.status, "installment status")?,
        installment_id: model.installment_id,
        loan_id: model.loan_id,
        installment_number: model.installment_number,
        due_date: model.due_date,
        amount: from_minor(model.amount),
        paid_date: model.paid_date,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn installment_to_active_model(item: &Installment) -> Result<installment::ActiveModel> {
    Ok(installment::ActiveModel {
        installment_id: Set(item.installment_id),
        loan_id: Set(item.loan_id.clone()),
        installment_number: Set(item.installment_number),
        due_date: Set(item.due_date),
        amount: Set(to_minor(item.amount)?),
        status: Set(item.status.to_string()),
        paid_date: Set(item.paid_date),
        created_at: Set(item.created_at),
        updated_at: Set(item.updated_at),
    })
}

pub fn model_to_payment(model: payment::Model) -> Result<Payment> {
    Ok(Payment {
        method: parse_enum(&model.method, "payment method")?,
        payment_id: model.payment_id,
        loan_id: model.loan_id,
        installment_id: model.installment_id,
        amount: from_minor(model.amount),
        payment_date: model.payment_date,
        remarks: model.remarks,
        utr: model.utr,
        recorded_by: model.recorded_by,
        created_at: model.created_at,
    })
}

pub fn model_to_lead(model: lead::Model) -> Result<Lead> {
    Ok(Lead {
        status: parse_enum(&model.status, "lead status")?,
        lead_id: model.lead_id,
        name: model.name,
        phone: model.phone,
        email: model.email,
        requested_amount: model.requested_amount.map(from_minor),
        branch: model.branch,
        source: model.source,
        assigned_to: model.assigned_to,
        notes: model.notes,
        client_id: model.client_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

/// `is_new` 为 true 时不设置自增主键
pub fn lead_to_active_model(lead: &Lead, is_new: bool) -> Result<lead::ActiveModel> {
    Ok(lead::ActiveModel {
        lead_id: if is_new { NotSet } else { Set(lead.lead_id) },
        name: Set(lead.name.clone()),
        phone: Set(lead.phone.clone()),
        email: Set(lead.email.clone()),
        requested_amount: Set(lead.requested_amount.map(to_minor).transpose()?),
        branch: Set(lead.branch.clone()),
        source: Set(lead.source.clone()),
        assigned_to: Set(lead.assigned_to.clone()),
        notes: Set(lead.notes.clone()),
        status: Set(lead.status.to_string()),
        client_id: Set(lead.client_id),
        created_at: Set(lead.created_at),
        updated_at: Set(lead.updated_at),
    })
}

pub fn model_to_client(model: client::Model) -> Result<Client> {
    Ok(Client {
        status: parse_enum(&model.status, "client status")?,
        client_id: model.client_id,
        name: model.name,
        phone: model.phone,
        email: model.email,
        address: model.address,
        id_proof: model.id_proof,
        branch: model.branch,
        lead_id: model.lead_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn client_to_active_model(client: &Client, is_new: bool) -> client::ActiveModel {
    client::ActiveModel {
        client_id: if is_new { NotSet } else { Set(client.client_id) },
        name: Set(client.name.clone()),
        phone: Set(client.phone.clone()),
        email: Set(client.email.clone()),
        address: Set(client.address.clone()),
        id_proof: Set(client.id_proof.clone()),
        branch: Set(client.branch.clone()),
        status: Set(client.status.to_string()),
        lead_id: Set(client.lead_id),
        created_at: Set(client.created_at),
        updated_at: Set(client.updated_at),
    }
}

pub fn model_to_user(model: user::Model) -> Result<User> {
    Ok(User {
        role: parse_enum(&model.role, "user role")?,
        status: parse_enum(&model.status, "user status")?,
        user_id: model.user_id,
        name: model.name,
        email: model.email,
        password_hash: model.password_hash,
        last_login_at: model.last_login_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn user_to_active_model(user: &User, is_new: bool) -> user::ActiveModel {
    user::ActiveModel {
        user_id: if is_new { NotSet } else { Set(user.user_id) },
        name: Set(user.name.clone()),
        email: Set(user.email.clone()),
        password_hash: Set(user.password_hash.clone()),
        role: Set(user.role.to_string()),
        status: Set(user.status.to_string()),
        last_login_at: Set(user.last_login_at),
        created_at: Set(user.created_at),
        updated_at: Set(user.updated_at),
    }
}

pub fn model_to_noc(model: noc::Model) -> Noc {
    Noc {
        reference_no: model.reference_no,
        loan_id: model.loan_id,
        borrower_name: model.borrower_name,
        issued_by: model.issued_by,
        issued_at: model.issued_at,
        note: model.note,
    }
}

pub fn noc_to_active_model(noc: &Noc) -> noc::ActiveModel {
    noc::ActiveModel {
        reference_no: Set(noc.reference_no.clone()),
        loan_id: Set(noc.loan_id.clone()),
        borrower_name: Set(noc.borrower_name.clone()),
        issued_by: Set(noc.issued_by.clone()),
        issued_at: Set(noc.issued_at),
        note: Set(noc.note.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{InstallmentStatus, LoanStatus};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn sample_loan_model() -> loan::Model {
        let now = Utc::now();
        loan::Model {
            loan_id: "LN0001".into(),
            client_id: Some(3),
            customer_name: "Asha Devi".into(),
            branch: "Patna".into(),
            sourced_by: None,
            loan_amount: 1_000_000,
            processing_fee: 50_000,
            gst: 9_000,
            net_disbursement: 941_000,
            repayment_amount: 1_200_000,
            interest_earned: 200_000,
            roi_bps: 2000,
            tenure_days: 98,
            date_of_disbursement: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            installment_amount: 85_700,
            total_installments: 14,
            status: "Active".into(),
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    #[test]
    fn test_model_to_loan_converts_paise() {
        let loan = model_to_loan(sample_loan_model()).unwrap();
        assert_eq!(loan.loan_amount, dec!(10000.00));
        assert_eq!(loan.gst, dec!(90.00));
        assert_eq!(loan.roi, dec!(20.00));
        assert_eq!(loan.status, LoanStatus::Active);
    }

    #[test]
    fn test_loan_active_model_matches_model() {
        let model = sample_loan_model();
        let loan = model_to_loan(model.clone()).unwrap();
        let am = loan_to_active_model(&loan).unwrap();
        assert_eq!(am.loan_amount, Set(model.loan_amount));
        assert_eq!(am.roi_bps, Set(model.roi_bps));
        assert_eq!(am.status, Set("Active".to_string()));
    }

    #[test]
    fn test_unknown_status_is_an_error() {
        let mut model = sample_loan_model();
        model.status = "Archived".into();
        assert!(model_to_loan(model).is_err());
    }

    #[test]
    fn test_installment_conversion() {
        let now = Utc::now();
        let model = installment::Model {
            installment_id: 9,
            loan_id: "LN0001".into(),
            installment_number: 2,
            due_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            amount: 85_700,
            status: "Overdue".into(),
            paid_date: None,
            created_at: now,
            updated_at: now,
        };
        let item = model_to_installment(model).unwrap();
        assert_eq!(item.amount, dec!(857.00));
        assert_eq!(item.status, InstallmentStatus::Overdue);
    }

    #[test]
    fn test_new_lead_leaves_key_unset() {
        let now = Utc::now();
        let lead = Lead {
            lead_id: 0,
            name: "Ravi".into(),
            phone: "9800000000".into(),
            email: None,
            requested_amount: Some(dec!(25000)),
            branch: None,
            source: None,
            assigned_to: None,
            notes: None,
            status: crate::storage::models::LeadStatus::Open,
            client_id: None,
            created_at: now,
            updated_at: now,
        };
        let am = lead_to_active_model(&lead, true).unwrap();
        assert_eq!(am.lead_id, NotSet);
        assert_eq!(am.requested_amount, Set(Some(2_500_000)));
    }
}
