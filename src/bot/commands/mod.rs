//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Menu (product) management commands
pub mod menu;

/// Table management commands
pub mod mesa;

/// Order flow commands for waiters and cooks
pub mod orden;

/// Sales report commands
pub mod report;

/// Staff management commands
pub mod staff;

// Export commands
pub use general::*;
pub use menu::*;
pub use mesa::*;
pub use orden::*;
pub use report::*;
pub use staff::*;
