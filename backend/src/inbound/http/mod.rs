//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod books;
pub mod chat;
pub mod conversations;
pub mod error;
pub mod health;
pub mod reading_list;
pub mod reading_stats;
pub mod recommendations;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
