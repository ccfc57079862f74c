//! CRM 路由表
//!
//! 静态路径（`/stats`、`/export` 等）必须先于 `{id}` 路由注册，
//! 否则会被 `{id}` 捕获

use actix_web::web;

use super::auth::{login, me};
use super::clients::{create_client, get_client, list_clients, update_client};
use super::export_import::{export_leads, export_loans, import_leads, import_loans};
use super::installments::{
    generate_installments, get_installment, list_installments, mark_overdue, update_installment,
};
use super::leads::{convert_lead, create_lead, get_lead, list_leads, update_lead};
use super::loans::{
    bulk_close_loans, create_loan, edit_loan, get_loan, get_noc, issue_noc, list_loans,
    loan_installments, loan_payments, loan_stats, update_loan_status,
};
use super::payments::{get_payment, list_payments, record_payment};
use super::users::{create_user, get_user, list_users, update_user};

/// `/auth`
pub fn auth_routes() -> actix_web::Scope {
    web::scope("/auth")
        .route("/login", web::post().to(login))
        .route("/me", web::get().to(me))
}

/// `/loans`
pub fn loans_routes() -> actix_web::Scope {
    web::scope("/loans")
        .route("", web::get().to(list_loans))
        .route("", web::post().to(create_loan))
        .route("/stats", web::get().to(loan_stats))
        .route("/export", web::get().to(export_loans))
        .route("/import", web::post().to(import_loans))
        .route("/bulk-close", web::post().to(bulk_close_loans))
        .route("/{loan_id}/status", web::put().to(update_loan_status))
        .route("/{loan_id}/installments", web::get().to(loan_installments))
        .route("/{loan_id}/payments", web::get().to(loan_payments))
        .route("/{loan_id}/noc", web::get().to(get_noc))
        .route("/{loan_id}/noc", web::post().to(issue_noc))
        .route("/{loan_id}", web::get().to(get_loan))
        .route("/{loan_id}", web::put().to(edit_loan))
}

/// `/installments`
pub fn installments_routes() -> actix_web::Scope {
    web::scope("/installments")
        .route("", web::get().to(list_installments))
        .route("/generate", web::post().to(generate_installments))
        .route("/mark-overdue", web::post().to(mark_overdue))
        .route("/{id}", web::get().to(get_installment))
        .route("/{id}", web::put().to(update_installment))
}

/// `/payments`
pub fn payments_routes() -> actix_web::Scope {
    web::scope("/payments")
        .route("", web::get().to(list_payments))
        .route("", web::post().to(record_payment))
        .route("/{id}", web::get().to(get_payment))
}

/// `/leads`
pub fn leads_routes() -> actix_web::Scope {
    web::scope("/leads")
        .route("", web::get().to(list_leads))
        .route("", web::post().to(create_lead))
        .route("/export", web::get().to(export_leads))
        .route("/import", web::post().to(import_leads))
        .route("/{id}/convert", web::post().to(convert_lead))
        .route("/{id}", web::get().to(get_lead))
        .route("/{id}", web::put().to(update_lead))
}

/// `/clients`
pub fn clients_routes() -> actix_web::Scope {
    web::scope("/clients")
        .route("", web::get().to(list_clients))
        .route("", web::post().to(create_client))
        .route("/{id}", web::get().to(get_client))
        .route("/{id}", web::put().to(update_client))
}

/// `/users`
pub fn users_routes() -> actix_web::Scope {
    web::scope("/users")
        .route("", web::get().to(list_users))
        .route("", web::post().to(create_user))
        .route("/{id}", web::get().to(get_user))
        .route("/{id}", web::put().to(update_user))
}

/// `prefix` 下的全部 CRM 路由，结果需要包裹 `CrmAuth`
pub fn crm_routes(prefix: &str) -> actix_web::Scope {
    web::scope(prefix)
        .service(auth_routes())
        .service(loans_routes())
        .service(installments_routes())
        .service(payments_routes())
        .service(leads_routes())
        .service(clients_routes())
        .service(users_routes())
}
