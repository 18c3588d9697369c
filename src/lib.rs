//! # Orbyt Sync Library
//!
//! External calendar synchronization for the Orbyt household app:
//! Google Calendar and Microsoft Graph webhook reconciliation, credential
//! refresh, and conflict detection against native events.

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod providers;
pub mod repositories;
pub mod server;
pub mod sync;
pub use migration;
