pub mod app;
pub mod auth;
pub mod board;
pub mod client;
pub mod config;
pub mod errors;
pub mod goals;
pub mod handlers;
pub mod models;
pub mod progress;
pub mod session;
pub mod state;
pub mod storage;
pub mod ui;

pub use app::router;
pub use board::Board;
pub use client::GoalClient;
pub use config::Config;
pub use state::AppState;
pub use storage::{load_data, persist_data};
