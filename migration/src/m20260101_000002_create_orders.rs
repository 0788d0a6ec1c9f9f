use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    UserId,
    IsGuest,
    CustomerName,
    CustomerEmail,
    CustomerPhone,
    ChefId,
    Items,
    DeliveryStreet,
    DeliveryCity,
    DeliveryPhone,
    TotalAmount,
    PaymentMethod,
    PaymentStatus,
    PaymentScreenshot,
    PaidAmount,
    PaymentVerifiedAt,
    VerifiedBy,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    // Null for guest checkouts
                    .col(ColumnDef::new(Orders::UserId).string().null())
                    .col(
                        ColumnDef::new(Orders::IsGuest)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Orders::CustomerName).string().null())
                    .col(ColumnDef::new(Orders::CustomerEmail).string().null())
                    .col(ColumnDef::new(Orders::CustomerPhone).string().null())
                    .col(ColumnDef::new(Orders::ChefId).uuid().null())
                    .col(ColumnDef::new(Orders::Items).json().not_null())
                    .col(ColumnDef::new(Orders::DeliveryStreet).string().not_null())
                    .col(ColumnDef::new(Orders::DeliveryCity).string().not_null())
                    .col(ColumnDef::new(Orders::DeliveryPhone).string().null())
                    .col(ColumnDef::new(Orders::TotalAmount).double().not_null())
                    .col(ColumnDef::new(Orders::PaymentMethod).string().not_null())
                    .col(
                        ColumnDef::new(Orders::PaymentStatus)
                            .string()
                            .not_null()
                            .default("Pending"),
                    )
                    .col(ColumnDef::new(Orders::PaymentScreenshot).string().null())
                    .col(ColumnDef::new(Orders::PaidAmount).double().null())
                    .col(
                        ColumnDef::new(Orders::PaymentVerifiedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Orders::VerifiedBy).string().null())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string()
                            .not_null()
                            .default("Pending"),
                    )
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_user_id")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_chef_id")
                    .table(Orders::Table)
                    .col(Orders::ChefId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_created_at")
                    .table(Orders::Table)
                    .col(Orders::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}
