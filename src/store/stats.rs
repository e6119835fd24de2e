use crate::error::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::fmt;

/// Library-wide counts shown by `vidq stats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibraryStats {
    pub total_files: u64,
    pub total_size_bytes: u64,
    pub files_with_metadata: u64,
    pub files_with_technical_info: u64,
    pub missing_files: u64,
    pub total_genres: u64,
    pub total_people: u64,
}

impl LibraryStats {
    pub(crate) fn collect(conn: &Connection) -> Result<Self> {
        let (total_files, total_size_bytes, missing_files): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(*) FILTER (WHERE is_missing = 0),
                    COALESCE(SUM(file_size) FILTER (WHERE is_missing = 0), 0),
                    COUNT(*) FILTER (WHERE is_missing <> 0)
             FROM media_files",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(Self {
            total_files: total_files.max(0) as u64,
            total_size_bytes: total_size_bytes.max(0) as u64,
            missing_files: missing_files.max(0) as u64,
            files_with_metadata: count(
                conn,
                "SELECT COUNT(*) FROM media_metadata m
                 JOIN media_files f ON f.file_id = m.file_id WHERE f.is_missing = 0",
            )?,
            files_with_technical_info: count(
                conn,
                "SELECT COUNT(*) FROM file_info t
                 JOIN media_files f ON f.file_id = t.file_id WHERE f.is_missing = 0",
            )?,
            total_genres: count(conn, "SELECT COUNT(*) FROM genres")?,
            total_people: count(conn, "SELECT COUNT(*) FROM people")?,
        })
    }
}

fn count(conn: &Connection, sql: &str) -> rusqlite::Result<u64> {
    conn.query_row(sql, [], |row| row.get::<_, i64>(0))
        .map(|n| n.max(0) as u64)
}

impl fmt::Display for LibraryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Library Statistics")?;
        writeln!(f, "==================")?;
        writeln!(f)?;
        writeln!(f, "Total files:      {}", self.total_files)?;
        writeln!(f, "Total size:       {}", format_size(self.total_size_bytes))?;
        writeln!(f, "With metadata:    {}", self.files_with_metadata)?;
        writeln!(f, "With tech info:   {}", self.files_with_technical_info)?;
        writeln!(f, "Missing files:    {}", self.missing_files)?;
        writeln!(f)?;
        writeln!(f, "Genres:           {}", self.total_genres)?;
        write!(f, "People:           {}", self.total_people)
    }
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
