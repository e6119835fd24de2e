//! Filter parsing, compilation and execution.
//!
//! `lexer` → `parser` → [`FilterSpec`] → `compiler` → `executor`.

pub mod ast;
pub mod compiler;
pub mod executor;
pub mod lexer;
pub mod parser;

pub use ast::{
    FieldKind, FilterSpec, FilterSpecBuilder, NumericBound, Operator, Page, Predicate, Relation,
    Resolution, SortDirection, SortField, SortSpec, Value,
};
pub use compiler::{CompiledQuery, SqlValue};
pub use executor::{
    FileEntry, Metadata, PreparedQuery, QueryExecutor, Record, RecordIter, TechnicalInfo,
};
pub use parser::{parse_field_value, parse_filter, parse_sort_value};
