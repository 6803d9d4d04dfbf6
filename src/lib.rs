//! Dashy licensing - license entitlement service for the Dashy desktop app
//!
//! This library provides the core functionality for the Dashy customer portal
//! backend: license issuance and redemption, entitlement evaluation, HWID
//! binding, and Discord role synchronization for paying customers.

pub mod config;
pub mod db;
pub mod discord;
pub mod entitlement;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod hwid;
pub mod keys;
pub mod middleware;
pub mod models;
pub mod roles;
pub mod util;
