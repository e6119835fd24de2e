use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vidq::output;
use vidq::query::{FieldKind, FilterSpec, Page, QueryExecutor};
use vidq::store::{CaseFolding, Store};
use vidq::utils::{AppConfig, get_config_path};
use vidq::{Error, FilterErrors};

#[derive(Parser)]
#[command(name = "vidq")]
#[command(about = "Filter and export a catalogued video library")]
struct Cli {
    /// Library database (defaults to the configured one)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List records matching a filter
    Search {
        #[command(flatten)]
        filter: FilterArgs,

        /// Maximum number of records (0 for all)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Records to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Emit JSON instead of a listing
        #[arg(long)]
        json: bool,

        /// Colour the listing
        #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
        color: ColorMode,
    },
    /// Count records matching a filter
    Count {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show the SQL a filter compiles to without running it
    Explain {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Write matching records to an M3U8 playlist
    Export {
        /// Playlist file to write
        output: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Replace the library root with this prefix in playlist paths
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Show library statistics
    Stats,
    /// Create the library schema in the database and write a default config
    Init,
}

/// Filter given as tokens, discrete flags, or both
#[derive(Args)]
struct FilterArgs {
    /// Filter tokens, e.g. `genre:action year:>2010 sort:rating_desc`
    filter: Vec<String>,

    /// Title, original title or file name contains
    #[arg(long)]
    title: Option<String>,

    /// Year: N, >N, <N or N-M
    #[arg(long, allow_hyphen_values = true)]
    year: Option<String>,

    /// Rating: N, >N, <N or N-M
    #[arg(long, allow_hyphen_values = true)]
    rating: Option<String>,

    /// Genre contains (repeatable)
    #[arg(long)]
    genre: Vec<String>,

    /// Actor name contains (repeatable)
    #[arg(long)]
    actor: Vec<String>,

    /// Director name contains (repeatable)
    #[arg(long)]
    director: Vec<String>,

    /// One of title_asc, title_desc, year_asc, year_desc, rating_asc,
    /// rating_desc, runtime_asc, runtime_desc, random
    #[arg(long)]
    sort: Option<String>,
}

impl FilterArgs {
    fn build(&self, page: Page) -> Result<FilterSpec, FilterErrors> {
        let mut builder = FilterSpec::builder();
        builder.parse(&self.filter.join(" "));

        let single = [
            (FieldKind::Title, &self.title),
            (FieldKind::Year, &self.year),
            (FieldKind::Rating, &self.rating),
        ];
        for (field, value) in single {
            if let Some(value) = value {
                builder.raw_value(field, value);
            }
        }
        let repeated = [
            (FieldKind::Genre, &self.genre),
            (FieldKind::Actor, &self.actor),
            (FieldKind::Director, &self.director),
        ];
        for (field, values) in repeated {
            for value in values {
                builder.raw_value(field, value);
            }
        }
        if let Some(sort) = &self.sort {
            builder.raw_sort(sort);
        }
        if let Some(limit) = page.limit {
            builder.limit(limit);
        }
        builder.offset(page.offset);
        builder.build()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Filter errors already list every bad token
            match err.downcast_ref::<Error>() {
                Some(Error::Filter(errors)) => eprintln!("error: {errors}"),
                _ => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load()?;
    let db_path = match cli.db {
        Some(path) => path,
        None => config.effective_database_path()?,
    };

    match cli.command {
        Commands::Search {
            filter,
            limit,
            offset,
            json,
            color,
        } => {
            let limit = match limit {
                Some(0) => None,
                Some(n) => Some(n),
                None => config.effective_limit(),
            };
            let spec = filter.build(Page { limit, offset }).map_err(Error::from)?;
            let store = open_store(&db_path, config.case_folding)?;
            let executor = QueryExecutor::new(&store);
            let records = executor.execute(&spec)?;

            if json {
                output::print_json(&records)?;
            } else {
                let color = match color {
                    ColorMode::Always => true,
                    ColorMode::Never => false,
                    ColorMode::Auto => std::io::stdout().is_terminal(),
                };
                output::print_records(&records, color)?;
                let total = executor.count(&spec)?;
                eprintln!("{} of {} record(s)", records.len(), total);
            }
        }
        Commands::Count { filter } => {
            let spec = filter.build(Page::default()).map_err(Error::from)?;
            let store = open_store(&db_path, config.case_folding)?;
            println!("{}", QueryExecutor::new(&store).count(&spec)?);
        }
        Commands::Explain { filter } => {
            let spec = filter.build(Page::default()).map_err(Error::from)?;
            let compiled = vidq::query::CompiledQuery::from_filter(&spec, config.case_folding);
            println!("-- filter: {spec}");
            println!("{}", compiled.sql());
            for (i, param) in compiled.params().iter().enumerate() {
                println!("-- ?{} = {param}", i + 1);
            }
        }
        Commands::Export {
            output: path,
            filter,
            prefix,
        } => {
            let spec = filter.build(Page::default()).map_err(Error::from)?;
            let store = open_store(&db_path, config.case_folding)?;
            let records = QueryExecutor::new(&store).execute(&spec)?;
            let prefix = prefix.or(config.path_prefix);
            output::export_m3u8(&path, &records, prefix.as_deref())
                .with_context(|| format!("Failed to write playlist {}", path.display()))?;
            println!("Wrote {} entries to {}", records.len(), path.display());
        }
        Commands::Stats => {
            let store = open_store(&db_path, config.case_folding)?;
            println!("{}", store.library_stats()?);
        }
        Commands::Init => {
            let store = Store::open(&db_path, config.case_folding)
                .with_context(|| format!("Failed to open {}", db_path.display()))?;
            store.create_schema()?;
            println!("Initialized {}", db_path.display());

            // First init remembers the database so later commands need no --db
            let config_path = get_config_path()?;
            if !config_path.exists() {
                let config = AppConfig {
                    database_path: Some(db_path.clone()),
                    ..config
                };
                config.save()?;
                println!("Wrote config {}", config_path.display());
            }
        }
    }

    Ok(())
}

fn open_store(path: &Path, folding: CaseFolding) -> Result<Store> {
    if !path.exists() {
        anyhow::bail!(
            "no library database at {} (run `vidq init` or pass --db)",
            path.display()
        );
    }
    Store::open_read_only(path, folding)
        .with_context(|| format!("Failed to open {}", path.display()))
}
