//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod listing;
pub mod socket_guard;
