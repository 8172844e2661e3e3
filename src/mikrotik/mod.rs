// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! `MikroTik` `RouterOS` API client module
//!
//! This module provides functionality to connect to `MikroTik` routers via the `RouterOS` API,
//! authenticate, keep one session per router and query its state.

mod client;
mod connection;
mod session;

// Re-export public types and functions
pub use client::RouterOsApi;
pub use connection::{encode_length, encode_sentence};
pub use session::SessionManager;
