//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete
//! and the role checks every staff command runs first.

/// Role checks against the staff table
pub mod access;
/// Autocomplete handlers for product names, table numbers and open orders
pub mod autocomplete;
