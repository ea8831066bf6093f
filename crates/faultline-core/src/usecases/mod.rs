//! Use cases (interactors) for Faultline
//!
//! This module contains the application use cases that orchestrate the
//! routing policy and the port interfaces. Use cases are thin coordinators
//! that delegate decisions to domain functions and I/O to ports.
//!
//! ## Use Cases
//!
//! - [`ErrorRouter`] - Noise filtering, routing decision and backend dispatch
//! - [`UserContextAnnotator`] - Session metadata for the crash backend

pub mod annotate_session;
pub mod route_error;

pub use annotate_session::UserContextAnnotator;
pub use route_error::{ErrorRouter, RouteOutcome};
