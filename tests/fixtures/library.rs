//! Seeded in-memory libraries shared by the integration tests.

#![allow(dead_code)]

use rusqlite::{Connection, params};
use vidq::query::Record;
use vidq::store::{CaseFolding, Store};

pub const ROOT: &str = "/srv/movies";

/// One catalogued file and everything attached to it.
#[derive(Default)]
pub struct Movie<'a> {
    pub id: i64,
    pub path: &'a str,
    pub missing: bool,
    pub title: Option<&'a str>,
    pub original_title: Option<&'a str>,
    pub year: Option<i64>,
    pub rating: Option<f64>,
    pub runtime: Option<i64>,
    pub genres: &'a [&'a str],
    pub actors: &'a [&'a str],
    pub directors: &'a [&'a str],
    pub studios: &'a [&'a str],
    pub countries: &'a [&'a str],
    pub sets: &'a [&'a str],
    pub tags: &'a [&'a str],
    /// codec, width, height, HDR format
    pub tech: Option<(&'a str, i64, i64, &'a str)>,
}

/// Empty store with the schema installed.
pub fn empty(folding: CaseFolding) -> Store {
    let store = Store::open_in_memory(folding).unwrap();
    store.create_schema().unwrap();
    store
        .connection()
        .execute("INSERT INTO roots (root_id, path) VALUES (1, ?1)", [ROOT])
        .unwrap();
    store
}

/// The standard test library with Unicode folding.
pub fn library() -> Store {
    library_with(CaseFolding::Unicode)
}

pub fn library_with(folding: CaseFolding) -> Store {
    let store = empty(folding);
    seed(&store, &movies());
    store
}

pub fn seed(store: &Store, movies: &[Movie<'_>]) {
    let conn = store.connection();
    for movie in movies {
        insert(conn, movie);
    }
}

/// Present files in the standard library
pub const PRESENT_FILES: usize = 11;

pub fn movies() -> Vec<Movie<'static>> {
    vec![
        Movie {
            id: 1,
            path: "Heat (1995)/Heat.mkv",
            title: Some("Heat"),
            year: Some(1995),
            rating: Some(8.3),
            runtime: Some(170),
            genres: &["Crime", "Thriller", "Drama"],
            actors: &["Al Pacino", "Robert De Niro"],
            directors: &["Michael Mann"],
            studios: &["Warner Bros."],
            countries: &["United States"],
            tech: Some(("hevc", 1920, 1080, "")),
            ..Movie::default()
        },
        Movie {
            id: 2,
            path: "Top Gun Maverick (2022)/Top.Gun.Maverick.2022.2160p.mkv",
            title: Some("Top Gun: Maverick"),
            year: Some(2022),
            rating: Some(8.2),
            runtime: Some(131),
            genres: &["Action", "Drama"],
            actors: &["Tom Cruise", "Miles Teller"],
            directors: &["Joseph Kosinski"],
            studios: &["Paramount Pictures"],
            countries: &["United States"],
            sets: &["Top Gun Collection"],
            tags: &["IMAX"],
            tech: Some(("hevc", 3840, 2160, "HDR10")),
            ..Movie::default()
        },
        Movie {
            id: 3,
            path: "Mission Impossible Fallout (2018)/MI6.mkv",
            title: Some("Mission: Impossible - Fallout"),
            year: Some(2018),
            rating: Some(7.7),
            runtime: Some(147),
            genres: &["Action", "Thriller"],
            actors: &["Tom Cruise", "Henry Cavill"],
            directors: &["Christopher McQuarrie"],
            studios: &["Paramount Pictures"],
            sets: &["Mission: Impossible Collection"],
            tech: Some(("h264", 1920, 800, "")),
            ..Movie::default()
        },
        Movie {
            id: 4,
            path: "Edge of Tomorrow (2014)/Edge.of.Tomorrow.mkv",
            title: Some("Edge of Tomorrow"),
            year: Some(2014),
            rating: Some(7.0),
            runtime: Some(113),
            genres: &["Action", "Science Fiction"],
            actors: &["Tom Cruise", "Emily Blunt"],
            directors: &["Doug Liman"],
            tech: Some(("avc", 1280, 720, "")),
            ..Movie::default()
        },
        Movie {
            id: 5,
            path: "Dune (2021)/Dune.2021.mkv",
            title: Some("Dune"),
            year: Some(2021),
            rating: Some(7.01),
            runtime: Some(155),
            genres: &["Science Fiction", "Adventure"],
            actors: &["Timothée Chalamet"],
            directors: &["Denis Villeneuve"],
            tech: Some(("hevc", 3840, 1600, "Dolby Vision")),
            ..Movie::default()
        },
        Movie {
            id: 6,
            path: "Amelie (2001)/Amelie.mkv",
            title: Some("Amélie"),
            original_title: Some("Le Fabuleux Destin d'Amélie Poulain"),
            year: Some(2001),
            rating: Some(8.3),
            runtime: Some(122),
            genres: &["Comedy", "Romance"],
            actors: &["Audrey Tautou"],
            directors: &["Jean-Pierre Jeunet"],
            countries: &["France"],
            ..Movie::default()
        },
        Movie {
            id: 7,
            path: "Home/home_video_2020.mp4",
            ..Movie::default()
        },
        Movie {
            id: 8,
            path: "Ghost (2020)/Ghost.mkv",
            missing: true,
            title: Some("Ghost"),
            year: Some(2020),
            rating: Some(9.9),
            genres: &["Action", "Drama"],
            ..Movie::default()
        },
        Movie {
            id: 9,
            path: "Parasite (2019)/Parasite.mkv",
            title: Some("Parasite"),
            year: Some(2019),
            rating: Some(8.5),
            runtime: Some(132),
            genres: &["Thriller", "Drama", "Comedy"],
            actors: &["Song Kang-ho"],
            directors: &["Bong Joon-ho"],
            countries: &["South Korea"],
            tech: Some(("hevc", 1920, 1040, "")),
            ..Movie::default()
        },
        Movie {
            id: 10,
            path: "Future Film (2025)/Future.Film.mkv",
            title: Some("Future Film"),
            year: Some(2025),
            genres: &["Action"],
            ..Movie::default()
        },
        Movie {
            id: 11,
            path: "Tenet (2020)/Tenet.mkv",
            title: Some("Tenet"),
            year: Some(2020),
            rating: Some(7.3),
            runtime: Some(150),
            genres: &["Action", "Science Fiction"],
            actors: &["John David Washington"],
            directors: &["Christopher Nolan"],
            tech: Some(("hevc", 3840, 2160, "")),
            ..Movie::default()
        },
        Movie {
            id: 12,
            path: "Furiosa (2024)/Furiosa.mkv",
            title: Some("Furiosa: A Mad Max Saga"),
            year: Some(2024),
            rating: Some(7.5),
            runtime: Some(148),
            genres: &["Action", "Adventure"],
            actors: &["Anya Taylor-Joy"],
            directors: &["George Miller"],
            ..Movie::default()
        },
    ]
}

fn insert(conn: &Connection, movie: &Movie<'_>) {
    let filename = movie.path.rsplit('/').next().unwrap();
    conn.execute(
        "INSERT INTO media_files (file_id, root_id, relative_path, filename, file_size, is_missing)
         VALUES (?1, 1, ?2, ?3, ?4, ?5)",
        params![movie.id, movie.path, filename, movie.id * 1_000_000, movie.missing],
    )
    .unwrap();

    if movie.title.is_some() || movie.year.is_some() {
        conn.execute(
            "INSERT INTO media_metadata (file_id, title, original_title, year, rating, runtime)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                movie.id,
                movie.title,
                movie.original_title,
                movie.year,
                movie.rating,
                movie.runtime
            ],
        )
        .unwrap();
    }

    if let Some((codec, width, height, hdr)) = movie.tech {
        conn.execute(
            "INSERT INTO file_info (file_id, video_codec, video_width, video_height, hdr_format)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![movie.id, codec, width, height, hdr],
        )
        .unwrap();
    }

    link(conn, movie.id, "genres", "genre_id", "media_genres", movie.genres);
    link(conn, movie.id, "people", "person_id", "media_actors", movie.actors);
    link(conn, movie.id, "people", "person_id", "media_directors", movie.directors);
    link(conn, movie.id, "studios", "studio_id", "media_studios", movie.studios);
    link(conn, movie.id, "countries", "country_id", "media_countries", movie.countries);
    link(conn, movie.id, "sets", "set_id", "media_sets", movie.sets);
    link(conn, movie.id, "tags", "tag_id", "media_tags", movie.tags);
}

fn link(conn: &Connection, file_id: i64, entity: &str, key: &str, junction: &str, names: &[&str]) {
    for name in names {
        conn.execute(
            &format!("INSERT OR IGNORE INTO {entity} (name) VALUES (?1)"),
            [name],
        )
        .unwrap();
        let entity_id: i64 = conn
            .query_row(
                &format!("SELECT {key} FROM {entity} WHERE name = ?1"),
                [name],
                |row| row.get(0),
            )
            .unwrap();
        conn.execute(
            &format!("INSERT INTO {junction} (file_id, {key}) VALUES (?1, ?2)"),
            params![file_id, entity_id],
        )
        .unwrap();
    }
}

pub fn ids(records: &[Record]) -> Vec<i64> {
    records.iter().map(|r| r.file.file_id).collect()
}

pub fn sorted_ids(records: &[Record]) -> Vec<i64> {
    let mut ids = ids(records);
    ids.sort_unstable();
    ids
}
