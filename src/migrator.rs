use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_menu_items_table::Migration),
            Box::new(m20240101_000002_create_dining_tables_table::Migration),
            Box::new(m20240101_000003_create_orders_table::Migration),
            Box::new(m20240101_000004_create_order_lines_table::Migration),
            Box::new(m20240101_000005_create_bills_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_menu_items_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_menu_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MenuItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MenuItems::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(MenuItems::Name).string().not_null())
                        .col(ColumnDef::new(MenuItems::Description).string().null())
                        .col(ColumnDef::new(MenuItems::Price).decimal().not_null())
                        .col(ColumnDef::new(MenuItems::Category).string().not_null())
                        .col(
                            ColumnDef::new(MenuItems::Available)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(MenuItems::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(MenuItems::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_menu_items_category")
                        .table(MenuItems::Table)
                        .col(MenuItems::Category)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MenuItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum MenuItems {
        Table,
        Id,
        Name,
        Description,
        Price,
        Category,
        Available,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_dining_tables_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_dining_tables_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DiningTables::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DiningTables::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(DiningTables::Number).integer().not_null())
                        .col(
                            ColumnDef::new(DiningTables::Capacity)
                                .integer()
                                .not_null()
                                .default(4),
                        )
                        .col(ColumnDef::new(DiningTables::Status).string().not_null())
                        .col(
                            ColumnDef::new(DiningTables::CurrentOrderId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DiningTables::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DiningTables::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_dining_tables_number")
                        .table(DiningTables::Table)
                        .col(DiningTables::Number)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DiningTables::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum DiningTables {
        Table,
        Id,
        Number,
        Capacity,
        Status,
        CurrentOrderId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_orders_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000002_create_dining_tables_table::DiningTables;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Orders::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Orders::TableId).big_integer().not_null())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::TaxRate)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::TaxAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::FinalTotal)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::PaymentMethod).string().not_null())
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_table_id")
                                .from(Orders::Table, Orders::TableId)
                                .to(DiningTables::Table, DiningTables::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_table_id")
                        .table(Orders::Table)
                        .col(Orders::TableId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Orders {
        Table,
        Id,
        TableId,
        Status,
        TotalAmount,
        TaxRate,
        TaxAmount,
        FinalTotal,
        PaymentMethod,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_order_lines_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_menu_items_table::MenuItems;
    use super::m20240101_000003_create_orders_table::Orders;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_order_lines_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderLines::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrderLines::OrderId).big_integer().not_null())
                        .col(
                            ColumnDef::new(OrderLines::MenuItemId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderLines::Quantity).integer().not_null())
                        .col(ColumnDef::new(OrderLines::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(OrderLines::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(OrderLines::UpdatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_lines_order_id")
                                .from(OrderLines::Table, OrderLines::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_lines_menu_item_id")
                                .from(OrderLines::Table, OrderLines::MenuItemId)
                                .to(MenuItems::Table, MenuItems::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_lines_order_id")
                        .table(OrderLines::Table)
                        .col(OrderLines::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderLines::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum OrderLines {
        Table,
        Id,
        OrderId,
        MenuItemId,
        Quantity,
        UnitPrice,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_bills_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000003_create_orders_table::Orders;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_bills_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Bills::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Bills::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Bills::OrderId).big_integer().not_null())
                        .col(ColumnDef::new(Bills::InvoiceNumber).big_integer().not_null())
                        .col(ColumnDef::new(Bills::Subtotal).decimal().not_null())
                        .col(ColumnDef::new(Bills::TaxRate).decimal().not_null())
                        .col(ColumnDef::new(Bills::TaxAmount).decimal().not_null())
                        .col(ColumnDef::new(Bills::Total).decimal().not_null())
                        .col(ColumnDef::new(Bills::PaymentMethod).string().not_null())
                        .col(ColumnDef::new(Bills::RestaurantName).string().not_null())
                        .col(ColumnDef::new(Bills::Address).string().not_null())
                        .col(ColumnDef::new(Bills::State).string().not_null())
                        .col(ColumnDef::new(Bills::StateCode).string().not_null())
                        .col(ColumnDef::new(Bills::Phone).string().not_null())
                        .col(ColumnDef::new(Bills::Gstin).string().not_null())
                        .col(ColumnDef::new(Bills::Fssai).string().not_null())
                        .col(ColumnDef::new(Bills::PlaceOfSupply).string().not_null())
                        .col(ColumnDef::new(Bills::BillDate).timestamp().not_null())
                        .col(ColumnDef::new(Bills::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bills_order_id")
                                .from(Bills::Table, Bills::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Both indexes are load-bearing: order_id uniqueness is the
            // at-most-one-bill-per-order guarantee, invoice_number uniqueness
            // is the arbiter for concurrent number assignment.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bills_order_id")
                        .table(Bills::Table)
                        .col(Bills::OrderId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bills_invoice_number")
                        .table(Bills::Table)
                        .col(Bills::InvoiceNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bills_created_at")
                        .table(Bills::Table)
                        .col(Bills::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Bills::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Bills {
        Table,
        Id,
        OrderId,
        InvoiceNumber,
        Subtotal,
        TaxRate,
        TaxAmount,
        Total,
        PaymentMethod,
        RestaurantName,
        Address,
        State,
        StateCode,
        Phone,
        Gstin,
        Fssai,
        PlaceOfSupply,
        BillDate,
        CreatedAt,
    }
}
