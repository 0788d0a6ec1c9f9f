use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Chefs {
    Table,
    Id,
    UserId,
    BusinessName,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Chefs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Chefs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Chefs::UserId).string().not_null())
                    .col(ColumnDef::new(Chefs::BusinessName).string().not_null())
                    .col(
                        ColumnDef::new(Chefs::CreatedAt)
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
                    .name("idx_chefs_user_id")
                    .table(Chefs::Table)
                    .col(Chefs::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chefs_business_name")
                    .table(Chefs::Table)
                    .col(Chefs::BusinessName)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Chefs::Table).to_owned())
            .await
    }
}
