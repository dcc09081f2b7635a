//! Command handlers

pub mod config;
pub mod product;
pub mod status;
