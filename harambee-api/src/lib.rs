//! # Harambee Hub API Server
//!
//! This library provides the core functionality for the Harambee Hub API
//! server: clubs, membership, communities, forums, knowledge base, tasks,
//! and the goal/objective planning subsystem.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
