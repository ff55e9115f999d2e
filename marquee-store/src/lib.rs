pub mod app_config;
pub mod database;
pub mod memory;
pub mod seat_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use memory::MemorySeatStore;
pub use seat_repo::PgSeatStore;
