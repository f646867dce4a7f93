pub mod api;
pub mod db;
pub mod environment;
pub mod error;
pub mod features;
pub mod ingest;
pub mod linker;
pub mod logging;
pub mod news;
pub mod pipeline;
pub mod rss;
pub mod vector;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_DB: &str = "db_query";
pub const TARGET_INGEST: &str = "ingest";
pub const TARGET_LINKER: &str = "news_linker";
