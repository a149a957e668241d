pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod history;
pub mod middleware;
pub mod permissions;
pub mod services;
pub mod types;

pub use app::{router, AppState};
