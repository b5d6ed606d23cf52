//! HTTP gateway that answers player subtitle requests from OpenSubtitles,
//! with a disk-backed, TTL-expiring cache in front of the provider.

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
