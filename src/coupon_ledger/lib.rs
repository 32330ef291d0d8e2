//! # Coupon Ledger Architecture
//!
//! A coupon-balance ledger: clients create a coupon, read it back, and add to
//! its balance. Each coupon lives in its own JSON file in one data directory.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Transport (http.rs, main.rs)                               │
//! │  - Routes, body parsing, status codes, process startup      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin, cloneable facade over commands                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Validates intents (id present, not reserved)             │
//! │  - Builds records and result messages                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - RecordStore trait: create-once, accumulate, snapshot     │
//! │  - FileStore (production), InMemoryStore (testing)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All consistency guarantees live in the storage layer. Per-coupon locks
//! serialize operations on one id while leaving other ids untouched, and
//! every write is a temp file renamed into place so a record on disk is never
//! half-written. The layers above only validate and translate.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: Create, get, update and doctor intents
//! - [`store`]: Storage trait and implementations
//! - [`model`]: `CouponRecord` and request payloads
//! - [`config`]: Configuration (defaults, JSON file, environment)
//! - [`http`]: axum router and server
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod store;
