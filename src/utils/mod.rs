//! Utility functions and helpers.
//!
//! - [`format`] - Number formatting for summaries
//! - [`progress`] - Progress display on stderr
//! - [`reader`] - Input file reader with automatic decompression
//! - [`time`] - Token expiry arithmetic
//!
//! # Examples
//!
//! ```no_run
//! use userpool_tools::utils::reader::open_file;
//! use std::io::{BufRead, BufReader};
//!
//! // users.jsonl.gz is decompressed transparently
//! let reader = BufReader::new(open_file("users.jsonl.gz").unwrap());
//! for line in reader.lines() {
//!     println!("{}", line.unwrap());
//! }
//! ```

pub mod format;
pub mod progress;
pub mod reader;
pub mod time;
