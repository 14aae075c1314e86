// src/lib.rs

//! threadwatch library
//!
//! Re-scans a paginated forum thread and reports posts that appeared since
//! the previous scan.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
