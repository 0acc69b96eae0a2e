//! HTTP front-end over the translator handle

pub mod api;
pub mod auth;
pub mod error;
