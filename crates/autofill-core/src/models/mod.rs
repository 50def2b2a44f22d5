//! Data models shared across the extraction and matching pipeline.

pub mod config;
pub mod form_data;
