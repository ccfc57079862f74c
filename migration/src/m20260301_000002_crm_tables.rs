use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Lead::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Lead::LeadId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Lead::Name).string().not_null())
                    .col(ColumnDef::new(Lead::Phone).string_len(32).not_null())
                    .col(ColumnDef::new(Lead::Email).string().null())
                    .col(ColumnDef::new(Lead::RequestedAmount).big_integer().null())
                    .col(ColumnDef::new(Lead::Branch).string().null())
                    .col(ColumnDef::new(Lead::Source).string().null())
                    .col(ColumnDef::new(Lead::AssignedTo).string().null())
                    .col(ColumnDef::new(Lead::Notes).text().null())
                    .col(
                        ColumnDef::new(Lead::Status)
                            .string_len(16)
                            .not_null()
                            .default("Open"),
                    )
                    .col(ColumnDef::new(Lead::ClientId).big_integer().null())
                    .col(
                        ColumnDef::new(Lead::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Lead::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_leads_status")
                    .table(Lead::Table)
                    .col(Lead::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_leads_phone")
                    .table(Lead::Table)
                    .col(Lead::Phone)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Client::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Client::ClientId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Client::Name).string().not_null())
                    .col(ColumnDef::new(Client::Phone).string_len(32).not_null())
                    .col(ColumnDef::new(Client::Email).string().null())
                    .col(ColumnDef::new(Client::Address).text().null())
                    .col(ColumnDef::new(Client::IdProof).string().null())
                    .col(ColumnDef::new(Client::Branch).string().null())
                    .col(
                        ColumnDef::new(Client::Status)
                            .string_len(16)
                            .not_null()
                            .default("Active"),
                    )
                    .col(ColumnDef::new(Client::LeadId).big_integer().null())
                    .col(
                        ColumnDef::new(Client::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Client::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::UserId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(User::Name).string().not_null())
                    .col(ColumnDef::new(User::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(User::PasswordHash).string().not_null())
                    .col(ColumnDef::new(User::Role).string_len(16).not_null())
                    .col(
                        ColumnDef::new(User::Status)
                            .string_len(16)
                            .not_null()
                            .default("Active"),
                    )
                    .col(
                        ColumnDef::new(User::LastLoginAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(User::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Noc::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Noc::ReferenceNo)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Noc::LoanId)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Noc::BorrowerName).string().not_null())
                    .col(ColumnDef::new(Noc::IssuedBy).string().not_null())
                    .col(
                        ColumnDef::new(Noc::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Noc::Note).text().null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Noc::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Client::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lead::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Lead {
    #[sea_orm(iden = "leads")]
    Table,
    LeadId,
    Name,
    Phone,
    Email,
    RequestedAmount,
    Branch,
    Source,
    AssignedTo,
    Notes,
    Status,
    ClientId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Client {
    #[sea_orm(iden = "clients")]
    Table,
    ClientId,
    Name,
    Phone,
    Email,
    Address,
    IdProof,
    Branch,
    Status,
    LeadId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "crm_users")]
    Table,
    UserId,
    Name,
    Email,
    PasswordHash,
    Role,
    Status,
    LastLoginAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Noc {
    #[sea_orm(iden = "nocs")]
    Table,
    ReferenceNo,
    LoanId,
    BorrowerName,
    IssuedBy,
    IssuedAt,
    Note,
}
