//! Feature modules (state, reducer, and view per feature).

pub mod auth;
