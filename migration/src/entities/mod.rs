pub mod client;
pub mod installment;
pub mod lead;
pub mod loan;
pub mod noc;
pub mod payment;
pub mod user;

pub use client::Entity as ClientEntity;
pub use installment::Entity as InstallmentEntity;
pub use lead::Entity as LeadEntity;
pub use loan::Entity as LoanEntity;
pub use noc::Entity as NocEntity;
pub use payment::Entity as PaymentEntity;
pub use user::Entity as UserEntity;
