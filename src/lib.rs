//! Task Board Server Library
//!
//! This module exports the core components for testing and integration.

pub mod assistant;
pub mod config;
pub mod db;
pub mod error;
pub mod server;
pub mod types;
