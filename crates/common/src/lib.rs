//! Shared contracts for the license plate recognition service.

pub mod recognition;
