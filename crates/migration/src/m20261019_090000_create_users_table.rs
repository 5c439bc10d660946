use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len(Users::Name, 100).not_null().to_owned())
                    .col(string_len(Users::Email, 254).not_null().unique_key().to_owned())
                    .col(string(Users::PasswordHash).not_null().to_owned())
                    .col(string_len_null(Users::BloodType, 8))
                    .col(json(Users::Allergies).not_null().to_owned())
                    .col(json(Users::Conditions).not_null().to_owned())
                    .col(json(Users::Medications).not_null().to_owned())
                    .col(json(Users::EmergencyContacts).not_null().to_owned())
                    .col(
                        string_len(Users::PublicToken, 64)
                            .not_null()
                            .unique_key()
                            .to_owned(),
                    )
                    .col(boolean(Users::IsActive).default(true).not_null().to_owned())
                    .col(
                        timestamp_with_time_zone(Users::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null()
                            .to_owned(),
                    )
                    .col(
                        timestamp_with_time_zone(Users::UpdatedAt)
                            .default(Expr::current_timestamp())
                            .not_null()
                            .to_owned(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    BloodType,
    Allergies,
    Conditions,
    Medications,
    EmergencyContacts,
    PublicToken,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
