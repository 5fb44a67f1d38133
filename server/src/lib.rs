//! Notekeeper library
//!
//! This library exposes the core functionality of Notekeeper for testing
//! and for the server binary.

pub mod app;
pub mod clients;
pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
pub mod services;
pub mod text;
pub mod web;
