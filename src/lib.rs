//! # vidq - Filter queries over a catalogued video library
//!
//! vidq turns a compact filter string such as
//! `year:2020-2024 genre:action rating:>7 actor:cruise sort:rating_desc`
//! into one parameterized SQLite query and materializes the matching files
//! for display, JSON emission or playlist export.
//!
//! ## Architecture
//!
//! - [`query`] - Lexing, parsing, compilation and execution of filters
//! - [`store`] - Database handle, case folding and the reference schema
//! - [`output`] - Listing, JSON and M3U8 rendering
//! - [`error`] - Per-token filter errors and execution failures
//! - [`utils`] - Configuration and app data directory
//!
//! ## Quick Start
//!
//! ```no_run
//! use vidq::query::{parse_filter, QueryExecutor};
//! use vidq::store::{CaseFolding, Store};
//!
//! let store = Store::open_read_only("media.db", CaseFolding::Unicode)?;
//! let filter = parse_filter("genre:action genre:drama sort:year_desc")?;
//!
//! for record in QueryExecutor::new(&store).execute(&filter)? {
//!     println!("{}", record.display_title());
//! }
//! # Ok::<(), vidq::Error>(())
//! ```
//!
//! ## Matching rules
//!
//! Predicates are conjunctive. Each multi-valued predicate (genre, actor,
//! director, studio, country, set, tag) is checked independently, so a file
//! tagged both Action and Drama matches `genre:action genre:drama`. Text
//! operands match as case-insensitive substrings; `%` and `_` are literal.

pub mod error;
pub mod output;
pub mod query;
pub mod store;
pub mod utils;

pub use error::{Error, FilterErrors, Result, TokenError};
