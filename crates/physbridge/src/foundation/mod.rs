//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the bridge:
//! - Math types and operations
//! - Conversions between renderer and physics conventions
//! - Logging utilities

pub mod math;
pub mod convert;
pub mod logging;
