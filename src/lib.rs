pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod images;
pub mod middleware;
pub mod state;
pub mod validation;
pub mod views;

pub use app::{app, service};
pub use error::AppError;
pub use state::AppState;
