//! Network operations
//!
//! HTTP client wrapper for the generative service endpoints.

pub mod client;

pub use client::HttpClient;
