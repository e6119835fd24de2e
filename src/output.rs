//! Rendering of query results: terminal listing, JSON and M3U8 playlists

use crate::query::Record;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print records as a coloured listing on stdout
pub fn print_records(records: &[Record], color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_records(&mut stdout, records)
}

/// Write a listing: title line, path, then any matched relation names
pub fn write_records<W: WriteColor>(out: &mut W, records: &[Record]) -> io::Result<()> {
    for record in records {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
        write!(out, "{}", record.display_title())?;
        out.reset()?;

        if let Some(rating) = record.rating() {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
            write!(out, "  {rating:.1}")?;
            out.reset()?;
        }
        if let Some(runtime) = record.runtime() {
            write!(out, "  {runtime} min")?;
        }
        if let Some(tech) = &record.technical {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
            if let Some(codec) = &tech.video_codec {
                write!(out, "  {codec}")?;
            }
            if let (Some(w), Some(h)) = (tech.video_width, tech.video_height) {
                write!(out, " {w}x{h}")?;
            }
            if let Some(hdr) = tech.hdr_format.as_deref().filter(|h| !h.is_empty()) {
                write!(out, " {hdr}")?;
            }
            out.reset()?;
        }
        writeln!(out)?;

        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        writeln!(out, "  {}", record.full_path().display())?;
        out.reset()?;

        for (relation, names) in &record.matched {
            if !names.is_empty() {
                writeln!(out, "  {relation}: {}", names.join(", "))?;
            }
        }
    }
    Ok(())
}

/// Print records as a pretty JSON array on stdout
pub fn print_json(records: &[Record]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_json(&mut out, records)?;
    writeln!(out)
}

pub fn write_json<W: Write>(out: &mut W, records: &[Record]) -> io::Result<()> {
    serde_json::to_writer_pretty(out, records).map_err(io::Error::from)
}

/// Write an extended M3U playlist.
///
/// With `prefix`, each entry's root path is replaced by the prefix, keeping
/// the path relative to the root.
pub fn write_m3u8<W: Write>(out: &mut W, records: &[Record], prefix: Option<&str>) -> io::Result<()> {
    writeln!(out, "#EXTM3U")?;
    for record in records {
        let seconds = match record.runtime() {
            Some(minutes) if minutes > 0 => minutes * 60,
            _ => -1,
        };
        writeln!(out, "#EXTINF:{seconds},{}", record.display_title())?;
        match prefix {
            Some(prefix) => writeln!(
                out,
                "{}/{}",
                prefix.trim_end_matches('/'),
                record.file.relative_path
            )?,
            None => writeln!(out, "{}", record.full_path().display())?,
        }
    }
    Ok(())
}

/// Write an M3U8 playlist file, replacing any existing one
pub fn export_m3u8(path: &Path, records: &[Record], prefix: Option<&str>) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut out = BufWriter::new(file);
    write_m3u8(&mut out, records, prefix)?;
    out.flush()
}
