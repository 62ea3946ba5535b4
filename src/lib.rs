//! Core of the MemoryLane journal: session gate, live memory collection,
//! image upload pipeline, derived views and place lookup, on top of
//! pluggable backends.

pub mod app;
pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;
pub mod views;

pub use app::MemoryLaneApp;
pub use config::Config;
pub use error::{AppError, AppResult};
