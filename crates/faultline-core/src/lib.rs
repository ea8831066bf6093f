//! Faultline Core - Error routing domain logic
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `RemoteFlag`, `ErrorEvent`, `RoutingDecision`, `UserContext`
//! - **Routing policy** - Pure functions deciding where an error report goes
//! - **Use cases** - `ErrorRouter`, `UserContextAnnotator`
//! - **Port definitions** - Traits for adapters: `IFlagSource`, `ICrashBackend`, `IChatWebhook`
//!
//! # Architecture
//!
//! The domain module contains pure policy with no I/O. Ports define the
//! trait interfaces that the remote and telemetry crates implement. Use cases
//! orchestrate the policy through the port interfaces and never propagate
//! failures from the reporting path to their callers.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
