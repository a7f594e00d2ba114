//! pocketfeed library
//!
//! This module exposes the reader's building blocks to the binary and to
//! integration tests.

pub mod actions;
pub mod activity;
pub mod app;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod comments;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod engagement;
pub mod fetch;
pub mod friends;
pub mod share;
pub mod storage;
pub mod ui;
