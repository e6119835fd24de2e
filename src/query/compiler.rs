//! Filter-to-SQL compilation.
//!
//! Scalar predicates become conditions on the file, metadata (`m`) and
//! technical-info (`t`) rows, which are joined once each. Every relational
//! predicate becomes its own correlated `EXISTS` over its junction table with
//! fresh aliases, so `genre:action genre:drama` asks for two independent
//! junction rows rather than one row matching both.

use crate::query::ast::{
    FilterSpec, NumericBound, Predicate, Relation, Resolution, SortDirection, SortField, SortSpec,
};
use crate::store::CaseFolding;
use rusqlite::ToSql;
use rusqlite::types::ToSqlOutput;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Separator used when a matched-names column packs several values.
pub(crate) const MATCHED_SEPARATOR: char = '\u{1f}';

const FROM_CLAUSE: &str = "FROM media_files f
JOIN roots r ON r.root_id = f.root_id
LEFT JOIN media_metadata m ON m.file_id = f.file_id
LEFT JOIN file_info t ON t.file_id = f.file_id";

const RECORD_COLUMNS: &str = "f.file_id AS file_id,
  r.path AS root_path,
  f.relative_path AS relative_path,
  f.filename AS filename,
  f.file_size AS file_size,
  m.file_id IS NOT NULL AS has_metadata,
  m.title AS title,
  m.original_title AS original_title,
  m.year AS year,
  m.rating AS rating,
  m.runtime AS runtime,
  m.plot AS plot,
  t.file_id IS NOT NULL AS has_technical,
  t.video_codec AS video_codec,
  t.video_width AS video_width,
  t.video_height AS video_height,
  t.hdr_format AS hdr_format";

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Integer(i) => ToSqlOutput::from(*i),
            SqlValue::Real(f) => ToSqlOutput::from(*f),
            SqlValue::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Integer(i) => write!(f, "{i}"),
            SqlValue::Real(v) => write!(f, "{v}"),
            SqlValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

/// One filter compiled to parameterized SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    sql: String,
    count_sql: String,
    params: Vec<SqlValue>,
    relations: Vec<Relation>,
    random: bool,
}

impl CompiledQuery {
    /// Compile a validated filter. Never fails: every predicate in a
    /// `FilterSpec` is already known to be well formed.
    pub fn from_filter(filter: &FilterSpec, folding: CaseFolding) -> Self {
        let compiler = QueryCompiler::new(folding);
        compiler.compile(filter)
    }

    /// Record query, ordered and paged.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// `COUNT(*)` over the same conditions, without ordering or paging.
    pub fn count_sql(&self) -> &str {
        &self.count_sql
    }

    /// Parameters for `?1..?N`, shared by both statements.
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Relations whose matched names are selected as `matched_<relation>`.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Whether the order is a fresh shuffle on every run.
    pub fn is_random(&self) -> bool {
        self.random
    }
}

/// Query compiler
struct QueryCompiler {
    folding: CaseFolding,
    conditions: Vec<String>,
    params: Vec<SqlValue>,
    /// Parameter slots of each relation's operands
    matched: BTreeMap<Relation, Vec<String>>,
    next_alias: usize,
}

impl QueryCompiler {
    fn new(folding: CaseFolding) -> Self {
        Self {
            folding,
            conditions: Vec::new(),
            params: Vec::new(),
            matched: BTreeMap::new(),
            next_alias: 0,
        }
    }

    fn compile(mut self, filter: &FilterSpec) -> CompiledQuery {
        for predicate in filter.predicates() {
            let condition = self.compile_predicate(predicate);
            self.conditions.push(condition);
        }

        let mut where_clause = String::from("f.is_missing = 0");
        for condition in &self.conditions {
            where_clause.push_str("\n  AND ");
            where_clause.push_str(condition);
        }

        let matched = std::mem::take(&mut self.matched);
        let mut columns = String::from(RECORD_COLUMNS);
        for (relation, slots) in &matched {
            columns.push_str(",\n  ");
            columns.push_str(&self.matched_column(*relation, slots));
        }

        let sort = filter.sort().unwrap_or_default();
        let mut sql = format!(
            "SELECT {columns}\n{FROM_CLAUSE}\nWHERE {where_clause}\nORDER BY {}",
            self.order_by(sort)
        );

        // SQLite reads integer literals above i64::MAX as REAL
        let page = filter.page();
        let offset = sql_integer(page.offset);
        match page.limit {
            Some(limit) => sql.push_str(&format!("\nLIMIT {}", sql_integer(limit))),
            None if offset > 0 => sql.push_str("\nLIMIT -1"),
            None => {}
        }
        if offset > 0 {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        let count_sql = format!("SELECT COUNT(*)\n{FROM_CLAUSE}\nWHERE {where_clause}");

        debug!(
            predicates = filter.predicates().len(),
            params = self.params.len(),
            sort = sort.as_str(),
            "compiled filter"
        );

        CompiledQuery {
            sql,
            count_sql,
            params: self.params,
            relations: matched.into_keys().collect(),
            random: sort == SortSpec::Random,
        }
    }

    /// Push a parameter, returning its `?N` placeholder.
    fn bind(&mut self, value: impl Into<SqlValue>) -> String {
        self.params.push(value.into());
        format!("?{}", self.params.len())
    }

    fn bind_folded(&mut self, text: &str) -> String {
        let folded = self.folding.fold(text);
        self.bind(folded)
    }

    fn alias(&mut self) -> usize {
        let n = self.next_alias;
        self.next_alias += 1;
        n
    }

    /// Case-insensitive substring test of `column` against a folded operand.
    fn contains(&self, column: &str, slot: &str) -> String {
        format!("instr({}({column}), {slot}) > 0", self.folding.sql_function())
    }

    fn compile_predicate(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::Title(text) => {
                let slot = self.bind_folded(text);
                format!(
                    "({} OR {} OR {})",
                    self.contains("m.title", &slot),
                    self.contains("m.original_title", &slot),
                    self.contains("f.filename", &slot)
                )
            }
            Predicate::Codec(text) => {
                let slot = self.bind_folded(text);
                self.contains("t.video_codec", &slot)
            }
            Predicate::Year(bound) => self.numeric("m.year", bound),
            Predicate::Rating(bound) => self.numeric("m.rating", bound),
            Predicate::Runtime(bound) => self.numeric("m.runtime", bound),
            Predicate::Resolution(resolution) => resolution_condition(*resolution).to_string(),
            Predicate::Hdr(true) => "COALESCE(t.hdr_format, '') <> ''".to_string(),
            Predicate::Hdr(false) => "COALESCE(t.hdr_format, '') = ''".to_string(),
            Predicate::Related { relation, needle } => self.related(*relation, needle),
        }
    }

    fn numeric<T>(&mut self, column: &str, bound: &NumericBound<T>) -> String
    where
        T: Copy + Into<SqlValue>,
    {
        match *bound {
            NumericBound::Equals(v) => format!("{column} = {}", self.bind(v)),
            NumericBound::GreaterThan(v) => format!("{column} > {}", self.bind(v)),
            NumericBound::LessThan(v) => format!("{column} < {}", self.bind(v)),
            NumericBound::Between(min, max) => {
                let lo = self.bind(min);
                let hi = self.bind(max);
                format!("{column} BETWEEN {lo} AND {hi}")
            }
        }
    }

    /// Independent existence check against the relation's junction table.
    fn related(&mut self, relation: Relation, needle: &str) -> String {
        let slot = self.bind_folded(needle);
        let n = self.alias();
        let condition = format!(
            "EXISTS (SELECT 1 {} AND {})",
            junction_scan(relation, n),
            self.contains(&format!("e{n}.name"), &slot)
        );
        self.matched.entry(relation).or_default().push(slot);
        condition
    }

    /// Names on this file that matched any operand of `relation`.
    fn matched_column(&mut self, relation: Relation, slots: &[String]) -> String {
        let n = self.alias();
        let column = format!("e{n}.name");
        let any: Vec<String> = slots.iter().map(|slot| self.contains(&column, slot)).collect();
        format!(
            "(SELECT group_concat({column}, char(31)) {} AND ({})) AS matched_{relation}",
            junction_scan(relation, n),
            any.join(" OR ")
        )
    }

    fn order_by(&self, sort: SortSpec) -> String {
        let (field, direction) = match sort {
            SortSpec::Random => return "RANDOM()".to_string(),
            SortSpec::By { field, direction } => (field, direction),
        };
        let dir = match direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        let key = match field {
            SortField::Title => format!(
                "{}(COALESCE(m.title, f.filename)) {dir}",
                self.folding.sql_function()
            ),
            SortField::Year => format!("m.year {dir} NULLS LAST"),
            SortField::Rating => format!("m.rating {dir} NULLS LAST"),
            SortField::Runtime => format!("m.runtime {dir} NULLS LAST"),
        };
        format!("{key}, f.file_id ASC")
    }
}

/// `FROM junction jN JOIN entity eN ... WHERE jN.file_id = f.file_id`
fn junction_scan(relation: Relation, n: usize) -> String {
    let key = relation.entity_key();
    format!(
        "FROM {junction} j{n} JOIN {entity} e{n} ON e{n}.{key} = j{n}.{key} WHERE j{n}.file_id = f.file_id",
        junction = relation.junction_table(),
        entity = relation.entity_table(),
    )
}

fn sql_integer(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn resolution_condition(resolution: Resolution) -> &'static str {
    match resolution {
        Resolution::FourK => "t.video_width >= 3840",
        Resolution::Hd => "(t.video_height >= 1080 AND t.video_height < 2160)",
        Resolution::Hd720 => "(t.video_height >= 720 AND t.video_height < 1080)",
    }
}
