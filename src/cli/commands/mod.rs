//! Command implementations

pub mod classify;
pub mod context;
pub mod headers;
pub mod mutate;
