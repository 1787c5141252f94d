//! Integration tests for the courier campaign dispatch engine

mod campaign_properties;
mod config_integration;
mod contact_sources;
mod control_signals;
pub mod test_utils;
