use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Loan::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Loan::LoanId)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Loan::ClientId).big_integer().null())
                    .col(ColumnDef::new(Loan::CustomerName).string().not_null())
                    .col(ColumnDef::new(Loan::Branch).string().not_null())
                    .col(ColumnDef::new(Loan::SourcedBy).string().null())
                    .col(ColumnDef::new(Loan::LoanAmount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Loan::ProcessingFee)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Loan::Gst).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Loan::NetDisbursement).big_integer().not_null())
                    .col(ColumnDef::new(Loan::RepaymentAmount).big_integer().not_null())
                    .col(ColumnDef::new(Loan::InterestEarned).big_integer().not_null())
                    .col(ColumnDef::new(Loan::RoiBps).big_integer().not_null())
                    .col(ColumnDef::new(Loan::TenureDays).integer().not_null())
                    .col(ColumnDef::new(Loan::DateOfDisbursement).date().not_null())
                    .col(ColumnDef::new(Loan::InstallmentAmount).big_integer().not_null())
                    .col(ColumnDef::new(Loan::TotalInstallments).integer().not_null())
                    .col(
                        ColumnDef::new(Loan::Status)
                            .string_len(16)
                            .not_null()
                            .default("Active"),
                    )
                    .col(
                        ColumnDef::new(Loan::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Loan::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Loan::ClosedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_loans_status")
                    .table(Loan::Table)
                    .col(Loan::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_loans_branch")
                    .table(Loan::Table)
                    .col(Loan::Branch)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_loans_disbursement")
                    .table(Loan::Table)
                    .col(Loan::DateOfDisbursement)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Installment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Installment::InstallmentId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Installment::LoanId).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Installment::InstallmentNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Installment::DueDate).date().not_null())
                    .col(ColumnDef::new(Installment::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Installment::Status)
                            .string_len(16)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(ColumnDef::new(Installment::PaidDate).date().null())
                    .col(
                        ColumnDef::new(Installment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Installment::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_installments_loan")
                            .from(Installment::Table, Installment::LoanId)
                            .to(Loan::Table, Loan::LoanId)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_installments_loan_number")
                    .table(Installment::Table)
                    .col(Installment::LoanId)
                    .col(Installment::InstallmentNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_installments_status_due")
                    .table(Installment::Table)
                    .col(Installment::Status)
                    .col(Installment::DueDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payment::PaymentId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payment::LoanId).string_len(64).not_null())
                    .col(ColumnDef::new(Payment::InstallmentId).big_integer().not_null())
                    .col(ColumnDef::new(Payment::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Payment::Method).string_len(16).not_null())
                    .col(ColumnDef::new(Payment::PaymentDate).date().not_null())
                    .col(ColumnDef::new(Payment::Remarks).text().null())
                    .col(ColumnDef::new(Payment::Utr).string().null())
                    .col(ColumnDef::new(Payment::RecordedBy).string().not_null())
                    .col(
                        ColumnDef::new(Payment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_loan")
                            .from(Payment::Table, Payment::LoanId)
                            .to(Loan::Table, Loan::LoanId)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_installment")
                            .from(Payment::Table, Payment::InstallmentId)
                            .to(Installment::Table, Installment::InstallmentId)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_payments_loan")
                    .table(Payment::Table)
                    .col(Payment::LoanId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payment::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Installment::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Loan::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Loan {
    #[sea_orm(iden = "loans_master")]
    Table,
    LoanId,
    ClientId,
    CustomerName,
    Branch,
    SourcedBy,
    LoanAmount,
    ProcessingFee,
    Gst,
    NetDisbursement,
    RepaymentAmount,
    InterestEarned,
    RoiBps,
    TenureDays,
    DateOfDisbursement,
    InstallmentAmount,
    TotalInstallments,
    Status,
    CreatedAt,
    UpdatedAt,
    ClosedAt,
}

#[derive(DeriveIden)]
enum Installment {
    #[sea_orm(iden = "installments")]
    Table,
    InstallmentId,
    LoanId,
    InstallmentNumber,
    DueDate,
    Amount,
    Status,
    PaidDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Payment {
    #[sea_orm(iden = "payments")]
    Table,
    PaymentId,
    LoanId,
    InstallmentId,
    Amount,
    Method,
    PaymentDate,
    Remarks,
    Utr,
    RecordedBy,
    CreatedAt,
}
