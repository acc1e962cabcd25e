//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, random bytes, Base64)
//! - Password hashing (Argon2id, configurable work factor)
//! - Cookie management
//! - Fixed-window rate limiting
//! - Client source-address extraction

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
pub mod rate_limit;
