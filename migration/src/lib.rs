pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_metals;
mod m20250601_000002_create_metal_prices;
mod m20250601_000003_create_metal_analyses;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_metals::Migration),
            Box::new(m20250601_000002_create_metal_prices::Migration),
            Box::new(m20250601_000003_create_metal_analyses::Migration),
        ]
    }
}
