//! ChainTube - isolated in-process chain environments for integration tests
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Harness
//! - [`bridge`] - Externally invocable operations over base64/JSON text
//! - [`registry`] - Environment table and the global mutation lock
//! - [`env`] - One chain instance and its block lifecycle
//! - [`param_registry`] - Type-url to parameter-set prototypes
//! - [`result`] - Result codec shared by both sides of the bridge
//!
//! ## Chain Application
//! - [`app`] - The `Application` seam and the reference `SimApp`
//! - [`abci`] - Block-lifecycle request/response shapes
//! - [`transaction`] - Transaction, coin and `Any` wire types
//!
//! ## Cryptography
//! - [`crypto`] - Addresses, key pairs and signatures (secp256k1)
//!
//! ## Driver Side
//! - [`runner`] - `TestApp`, signing accounts and typed module wrappers
//! - [`server`] - JSON-lines command server used by `chaintube-bridge`
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Harness
// ============================================================================
pub mod bridge;
pub mod env;
pub mod param_registry;
pub mod registry;
pub mod result;

// ============================================================================
// Chain Application
// ============================================================================
pub mod abci;
pub mod app;
pub mod transaction;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Driver Side
// ============================================================================
pub mod runner;
pub mod server;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
