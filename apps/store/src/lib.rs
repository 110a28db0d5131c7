//! Platform Store Library
//!
//! Data access for the teams of a multi-tenant messaging platform. Every
//! store operation runs concurrently and delivers a single result through a
//! one-shot channel; reads are spread over replicas and writes go to the
//! master.

pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
