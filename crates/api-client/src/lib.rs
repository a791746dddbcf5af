//! HTTP client for the vidflow video ingestion API.
//!
//! Async client using `reqwest`, one method per endpoint of the upload,
//! thumbnail, status and publish contract.

pub mod client;

pub use client::{Client, Error};
