//! Coursework - course, lection and homework management backend
//!
//! This library provides the core functionality for the coursework service.
//! It exposes all modules for testing purposes.

pub mod authz;
pub mod entities;
pub mod errors;
pub mod jobs;
pub mod operations;
pub mod resolve;
pub mod session;
pub mod settings;
pub mod storage;
pub mod web;
