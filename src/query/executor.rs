use crate::error::{Error, Result};
use crate::query::ast::{FilterSpec, Relation};
use crate::query::compiler::{CompiledQuery, MATCHED_SEPARATOR};
use crate::store::Store;
use rusqlite::{Row, Rows, Statement, params_from_iter};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::trace;

/// A catalogued file as stored, independent of metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    pub file_id: i64,
    pub root_path: String,
    pub relative_path: String,
    pub filename: String,
    pub file_size: u64,
}

/// Descriptive metadata, at most one row per file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub year: Option<i64>,
    pub rating: Option<f64>,
    /// Minutes
    pub runtime: Option<i64>,
    pub plot: Option<String>,
}

/// Stream details, at most one row per file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TechnicalInfo {
    pub video_codec: Option<String>,
    pub video_width: Option<i64>,
    pub video_height: Option<i64>,
    pub hdr_format: Option<String>,
}

/// One query result.
///
/// `matched` is for display only: for every relation the filter referenced,
/// the names on this file that satisfied one of that relation's operands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub file: FileEntry,
    pub metadata: Option<Metadata>,
    pub technical: Option<TechnicalInfo>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub matched: BTreeMap<Relation, Vec<String>>,
}

impl Record {
    /// `Title (Year)`, falling back to the file name.
    pub fn display_title(&self) -> String {
        let meta = self.metadata.as_ref();
        let title = meta
            .and_then(|m| m.title.as_deref())
            .unwrap_or(&self.file.filename);
        match meta.and_then(|m| m.year) {
            Some(year) => format!("{title} ({year})"),
            None => title.to_string(),
        }
    }

    pub fn full_path(&self) -> PathBuf {
        PathBuf::from(&self.file.root_path).join(&self.file.relative_path)
    }

    pub fn runtime(&self) -> Option<i64> {
        self.metadata.as_ref().and_then(|m| m.runtime)
    }

    pub fn rating(&self) -> Option<f64> {
        self.metadata.as_ref().and_then(|m| m.rating)
    }

    /// Matched names for `relation`, empty when it was not filtered on.
    pub fn matched(&self, relation: Relation) -> &[String] {
        self.matched.get(&relation).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Query executor
pub struct QueryExecutor<'a> {
    store: &'a Store,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Compile with the store's case-folding rule.
    pub fn compile(&self, filter: &FilterSpec) -> CompiledQuery {
        CompiledQuery::from_filter(filter, self.store.folding())
    }

    /// Compile and prepare without running anything.
    pub fn prepare(&self, filter: &FilterSpec) -> Result<PreparedQuery<'a>> {
        let compiled = self.compile(filter);
        let statement = self
            .store
            .connection()
            .prepare(compiled.sql())
            .map_err(Error::Execution)?;
        Ok(PreparedQuery {
            statement,
            compiled,
        })
    }

    /// Run a filter to completion.
    pub fn execute(&self, filter: &FilterSpec) -> Result<Vec<Record>> {
        let mut prepared = self.prepare(filter)?;
        let records = prepared.records()?.collect::<Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Number of matching records, ignoring paging.
    pub fn count(&self, filter: &FilterSpec) -> Result<u64> {
        let compiled = self.compile(filter);
        self.store
            .connection()
            .query_row(
                compiled.count_sql(),
                params_from_iter(compiled.params()),
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n.max(0) as u64)
            .map_err(Error::Execution)
    }
}

/// A compiled filter bound to a prepared statement.
pub struct PreparedQuery<'a> {
    statement: Statement<'a>,
    compiled: CompiledQuery,
}

impl<'a> PreparedQuery<'a> {
    pub fn compiled(&self) -> &CompiledQuery {
        &self.compiled
    }

    /// Start a run. Each call executes the statement again.
    pub fn records(&mut self) -> Result<RecordIter<'_>> {
        let rows = self
            .statement
            .query(params_from_iter(self.compiled.params()))
            .map_err(Error::Execution)?;
        Ok(RecordIter {
            rows,
            relations: self.compiled.relations(),
            produced: 0,
            done: false,
        })
    }
}

/// Lazily materialized records of one run.
///
/// Finite and not restartable. Stops after the first error.
pub struct RecordIter<'s> {
    rows: Rows<'s>,
    relations: &'s [Relation],
    produced: usize,
    done: bool,
}

impl Iterator for RecordIter<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = match self.rows.next() {
            Ok(Some(row)) => record_from_row(row, self.relations),
            Ok(None) => {
                self.done = true;
                trace!(records = self.produced, "query exhausted");
                return None;
            }
            Err(err) => Err(err),
        };
        match next {
            Ok(record) => {
                self.produced += 1;
                Some(Ok(record))
            }
            Err(err) => {
                self.done = true;
                Some(Err(Error::Execution(err)))
            }
        }
    }
}

impl std::iter::FusedIterator for RecordIter<'_> {}

fn record_from_row(row: &Row<'_>, relations: &[Relation]) -> rusqlite::Result<Record> {
    let file = FileEntry {
        file_id: row.get("file_id")?,
        root_path: row.get("root_path")?,
        relative_path: row.get("relative_path")?,
        filename: row.get("filename")?,
        file_size: row.get::<_, i64>("file_size")?.max(0) as u64,
    };

    let metadata = if row.get::<_, bool>("has_metadata")? {
        Some(Metadata {
            title: row.get("title")?,
            original_title: row.get("original_title")?,
            year: row.get("year")?,
            rating: row.get("rating")?,
            runtime: row.get("runtime")?,
            plot: row.get("plot")?,
        })
    } else {
        None
    };

    let technical = if row.get::<_, bool>("has_technical")? {
        Some(TechnicalInfo {
            video_codec: row.get("video_codec")?,
            video_width: row.get("video_width")?,
            video_height: row.get("video_height")?,
            hdr_format: row.get("hdr_format")?,
        })
    } else {
        None
    };

    let mut matched = BTreeMap::new();
    for relation in relations {
        let column = format!("matched_{relation}");
        let packed: Option<String> = row.get(column.as_str())?;
        let mut names: Vec<String> = packed
            .as_deref()
            .unwrap_or_default()
            .split(MATCHED_SEPARATOR)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        matched.insert(*relation, names);
    }

    Ok(Record {
        file,
        metadata,
        technical,
        matched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::parse_filter;
    use crate::store::CaseFolding;

    fn seeded() -> Store {
        let store = Store::open_in_memory(CaseFolding::Unicode).unwrap();
        store.create_schema().unwrap();
        store
            .connection()
            .execute_batch(
                "INSERT INTO roots (root_id, path) VALUES (1, '/movies');
                 INSERT INTO media_files (file_id, root_id, relative_path, filename, file_size)
                 VALUES (1, 1, 'Heat (1995)/Heat.mkv', 'Heat.mkv', 100),
                        (2, 1, 'loose.mkv', 'loose.mkv', 50);
                 INSERT INTO media_metadata (file_id, title, year, rating, runtime)
                 VALUES (1, 'Heat', 1995, 8.3, 170);
                 INSERT INTO file_info (file_id, video_codec, video_width, video_height)
                 VALUES (1, 'hevc', 1920, 1080);
                 INSERT INTO genres (genre_id, name) VALUES (1, 'Crime'), (2, 'Thriller'), (3, 'Drama');
                 INSERT INTO media_genres (file_id, genre_id) VALUES (1, 1), (1, 2), (1, 3);",
            )
            .unwrap();
        store
    }

    #[test]
    fn test_materializes_optional_rows() {
        let store = seeded();
        let records = QueryExecutor::new(&store)
            .execute(&FilterSpec::default())
            .unwrap();
        assert_eq!(records.len(), 2);

        let heat = &records[0];
        assert_eq!(heat.display_title(), "Heat (1995)");
        assert_eq!(heat.full_path(), PathBuf::from("/movies/Heat (1995)/Heat.mkv"));
        assert_eq!(heat.runtime(), Some(170));
        assert_eq!(heat.technical.as_ref().unwrap().video_codec.as_deref(), Some("hevc"));

        let loose = &records[1];
        assert_eq!(loose.metadata, None);
        assert_eq!(loose.technical, None);
        assert_eq!(loose.display_title(), "loose.mkv");
    }

    #[test]
    fn test_matched_names_are_sorted_and_filtered() {
        let store = seeded();
        let filter = parse_filter("genre:thr genre:crime").unwrap();
        let records = QueryExecutor::new(&store).execute(&filter).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].matched(Relation::Genre), &["Crime", "Thriller"]);
        assert!(records[0].matched(Relation::Actor).is_empty());
    }

    #[test]
    fn test_record_iter_is_lazy_and_fused() {
        let store = seeded();
        let executor = QueryExecutor::new(&store);
        let mut prepared = executor.prepare(&FilterSpec::default()).unwrap();
        let mut iter = prepared.records().unwrap();
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_count_ignores_paging() {
        let store = seeded();
        let filter = FilterSpec::builder().limit(1).build().unwrap();
        let executor = QueryExecutor::new(&store);
        assert_eq!(executor.count(&filter).unwrap(), 2);
        assert_eq!(executor.execute(&filter).unwrap().len(), 1);
    }

    #[test]
    fn test_store_failure_is_execution_error() {
        let store = Store::open_in_memory(CaseFolding::Unicode).unwrap();
        let err = QueryExecutor::new(&store)
            .execute(&FilterSpec::default())
            .unwrap_err();
        assert!(matches!(err, Error::Execution(_)));
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn test_record_json() {
        let store = seeded();
        let filter = parse_filter("genre:crime").unwrap();
        let records = QueryExecutor::new(&store).execute(&filter).unwrap();
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["file"]["filename"], "Heat.mkv");
        assert_eq!(json["metadata"]["year"], 1995);
        assert_eq!(json["matched"]["genre"][0], "Crime");
    }
}
