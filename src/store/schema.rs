//! Reference schema the query compiler targets.
//!
//! One row per file in `media_files`, at most one row per file in
//! `media_metadata` and `file_info`, and one junction table per
//! multi-valued relation keyed by `(file_id, entity_id)`. Entity names use
//! `COLLATE NOCASE` so exact lookups are case-insensitive.

/// Idempotent DDL for an empty database.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS roots (
    root_id INTEGER PRIMARY KEY,
    path TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS media_files (
    file_id INTEGER PRIMARY KEY,
    root_id INTEGER NOT NULL REFERENCES roots(root_id) ON DELETE CASCADE,
    relative_path TEXT NOT NULL,
    filename TEXT NOT NULL,
    file_size INTEGER NOT NULL DEFAULT 0,
    is_missing INTEGER NOT NULL DEFAULT 0,
    UNIQUE (root_id, relative_path)
);

CREATE TABLE IF NOT EXISTS media_metadata (
    file_id INTEGER PRIMARY KEY REFERENCES media_files(file_id) ON DELETE CASCADE,
    title TEXT,
    original_title TEXT,
    year INTEGER,
    rating REAL,
    runtime INTEGER,
    plot TEXT
);

CREATE TABLE IF NOT EXISTS file_info (
    file_id INTEGER PRIMARY KEY REFERENCES media_files(file_id) ON DELETE CASCADE,
    video_codec TEXT,
    video_width INTEGER,
    video_height INTEGER,
    hdr_format TEXT
);

CREATE TABLE IF NOT EXISTS genres (
    genre_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE
);

CREATE TABLE IF NOT EXISTS people (
    person_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE
);

CREATE TABLE IF NOT EXISTS studios (
    studio_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE
);

CREATE TABLE IF NOT EXISTS countries (
    country_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE
);

CREATE TABLE IF NOT EXISTS sets (
    set_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE
);

CREATE TABLE IF NOT EXISTS tags (
    tag_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE
);

CREATE TABLE IF NOT EXISTS media_genres (
    file_id INTEGER NOT NULL REFERENCES media_files(file_id) ON DELETE CASCADE,
    genre_id INTEGER NOT NULL REFERENCES genres(genre_id) ON DELETE CASCADE,
    PRIMARY KEY (file_id, genre_id)
);

CREATE TABLE IF NOT EXISTS media_actors (
    file_id INTEGER NOT NULL REFERENCES media_files(file_id) ON DELETE CASCADE,
    person_id INTEGER NOT NULL REFERENCES people(person_id) ON DELETE CASCADE,
    role TEXT,
    PRIMARY KEY (file_id, person_id)
);

CREATE TABLE IF NOT EXISTS media_directors (
    file_id INTEGER NOT NULL REFERENCES media_files(file_id) ON DELETE CASCADE,
    person_id INTEGER NOT NULL REFERENCES people(person_id) ON DELETE CASCADE,
    PRIMARY KEY (file_id, person_id)
);

CREATE TABLE IF NOT EXISTS media_studios (
    file_id INTEGER NOT NULL REFERENCES media_files(file_id) ON DELETE CASCADE,
    studio_id INTEGER NOT NULL REFERENCES studios(studio_id) ON DELETE CASCADE,
    PRIMARY KEY (file_id, studio_id)
);

CREATE TABLE IF NOT EXISTS media_countries (
    file_id INTEGER NOT NULL REFERENCES media_files(file_id) ON DELETE CASCADE,
    country_id INTEGER NOT NULL REFERENCES countries(country_id) ON DELETE CASCADE,
    PRIMARY KEY (file_id, country_id)
);

CREATE TABLE IF NOT EXISTS media_sets (
    file_id INTEGER NOT NULL REFERENCES media_files(file_id) ON DELETE CASCADE,
    set_id INTEGER NOT NULL REFERENCES sets(set_id) ON DELETE CASCADE,
    PRIMARY KEY (file_id, set_id)
);

CREATE TABLE IF NOT EXISTS media_tags (
    file_id INTEGER NOT NULL REFERENCES media_files(file_id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(tag_id) ON DELETE CASCADE,
    PRIMARY KEY (file_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_media_files_root ON media_files(root_id);
CREATE INDEX IF NOT EXISTS idx_media_metadata_year ON media_metadata(year);
CREATE INDEX IF NOT EXISTS idx_media_metadata_rating ON media_metadata(rating);
CREATE INDEX IF NOT EXISTS idx_media_genres_entity ON media_genres(genre_id);
CREATE INDEX IF NOT EXISTS idx_media_actors_entity ON media_actors(person_id);
CREATE INDEX IF NOT EXISTS idx_media_directors_entity ON media_directors(person_id);
"#;
