//! # sasbot
//!
//! HTTP API and CLI for the SASbot tenant configuration service. All tenant
//! logic lives in `sasbot-core`; this crate adds transport, operator
//! commands and logging.

pub mod api;
pub mod cli;
