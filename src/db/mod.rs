// Re-export the Database struct and other public items
pub mod core;
mod news;
mod player;
mod profile;
mod schema;

pub use self::core::Database;
pub use self::news::NewsArticle;
pub use self::player::{Player, PlayerSummary};
pub use sqlx::Row;
