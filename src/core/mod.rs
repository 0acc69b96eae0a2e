//! Core translation orchestration module

pub mod bridge;
pub mod config;
pub mod engine;
pub mod errors;
pub mod handle;
pub mod models;
pub mod pivot;
pub mod registry;
pub mod service;
