pub mod access;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod integrations;
pub mod middleware;
pub mod server;
pub mod services;
pub mod state;
pub mod validation;

pub use server::app;
pub use state::AppState;
