pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_containers;
mod m20250302_000002_create_structure_tables;
mod m20250318_000003_add_content_info_fields;
mod m20250402_000004_add_display_order_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_containers::Migration),
            Box::new(m20250302_000002_create_structure_tables::Migration),
            Box::new(m20250318_000003_add_content_info_fields::Migration),
            Box::new(m20250402_000004_add_display_order_indexes::Migration),
        ]
    }
}
