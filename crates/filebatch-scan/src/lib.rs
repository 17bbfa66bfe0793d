//! File discovery for filebatch.
//!
//! Given a root directory and an include pattern, returns the matching files
//! as paths relative to the root, in a stable order. Traversal uses jwalk and
//! matching uses globset.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use filebatch_scan::find_matching_files;
//!
//! let files = find_matching_files(Path::new("/srv/inbox"), "**/*.xml").unwrap();
//! for relative in &files {
//!     println!("{}", relative.display());
//! }
//! ```

mod matcher;

pub use matcher::{discovery_order, find_matching_files, PatternMatcher};

pub use filebatch_core::TransferError;
