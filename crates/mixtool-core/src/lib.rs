//! Core infrastructure for mixtool.
//!
//! This crate provides language-agnostic infrastructure:
//! - Edit IR for representing rename transactions
//! - Error types and error codes
//! - Text utilities for byte offset / line:column conversions
//! - Shared location types for plan output

pub mod error;
pub mod patch;
pub mod text;
pub mod types;
