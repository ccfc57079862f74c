pub mod backend;
pub mod models;

pub use backend::{
    ClientFilter, CrmStorage, InstallmentFilter, LeadFilter, LoanFilter, NewPayment, PaymentFilter,
    UserFilter, infer_backend_from_url, retry,
};
pub use models::*;
