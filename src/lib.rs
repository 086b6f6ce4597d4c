pub mod analysis;
pub mod app;
pub mod backend;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod sentiment;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::router;
pub use backend::{Backend, LocalBackend};
pub use config::Config;
pub use state::AppState;
