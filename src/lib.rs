//! ZeroShark
//!
//! Query, normalize, and aggregate threat-intelligence lookups across
//! third-party vendor APIs.

pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod providers;
pub mod report;
pub mod session;
pub mod whois;
