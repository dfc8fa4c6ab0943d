//! Utility Functions and Diagnostics
//!
//! Startup diagnostics and user-friendly error formatting for the binary.
//!
//! ## Diagnostics
//!
//! ```rust,ignore
//! use headunit_services::utils::{log_startup_diagnostics, SystemInfo};
//!
//! let sys_info = SystemInfo::gather();
//! sys_info.log();
//!
//! log_startup_diagnostics(&config);
//! ```
//!
//! ## Error Formatting
//!
//! ```rust,ignore
//! use headunit_services::utils::format_user_error;
//!
//! if let Err(e) = run().await {
//!     eprintln!("{}", format_user_error(&e));
//! }
//! ```
//!
//! Error categories with context-aware help:
//! - Config errors → file location, TOML syntax, rejected values
//! - Transport errors → phone link closed or unresponsive
//! - Platform errors → video/audio/input device unavailable
//! - Bluetooth errors → adapter address and availability

pub mod diagnostics;
pub mod errors;

pub use diagnostics::{log_startup_diagnostics, SystemInfo};
pub use errors::format_user_error;
