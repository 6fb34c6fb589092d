/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - Installation configuration (config.rs)
/// - The device-local key/value store (local.rs)
/// - The cloud catalog client (remote.rs)
/// - The reconciliation engine that ties the two backends together (engine.rs)
/// - The active-profile session (session.rs)

pub mod config;
pub mod data;
pub mod engine;
pub mod local;
pub mod remote;
pub mod session;
