// src/lib.rs

//! animag library
//!
//! Searches anime torrent index sites and normalizes their listings into
//! [`models::Record`]s. Start from [`session::Session`].

pub mod error;
pub mod models;
pub mod session;
pub mod sources;
pub mod storage;
pub mod utils;
