//! Application layer for the `autoindex` binary.

pub(crate) mod exit_handler;
pub(crate) mod inventory_output;
pub(crate) mod progress;
pub(crate) mod runtime;
pub(crate) mod settings;
pub(crate) mod terminal;
