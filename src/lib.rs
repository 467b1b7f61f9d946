// src/lib.rs

//! Card Crawler Library
//!
//! Fetches card detail pages, extracts name, ability and attack text, and
//! upserts them into Postgres.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
