use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use memmap2::Mmap;
use searchdex::index::build::{BuildOptions, build_from_file};
use searchdex::index::reader::SearchData;
use searchdex::index::stats::{format_dump, format_stats};
use searchdex::index::types::IndexConfig;
use searchdex::index::writer::decode_script;
use searchdex::output::print_results;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "searchdex")]
#[command(about = "Build and query compact prefix search data for documentation sites")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log more (repeat for trace output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build search data from a JSON list of entries
    Build {
        /// JSON file with the entries to index
        entries: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Build sub-tries in parallel and merge them
        #[arg(short, long)]
        parallel: bool,

        /// Hide progress bars
        #[arg(short, long)]
        quiet: bool,
    },
    /// Look up prefixes in a search data file
    Query {
        /// Binary (`.bin`) or script (`.js`) search data
        data: PathBuf,

        /// Prefixes to look up
        #[arg(required = true)]
        prefixes: Vec<String>,

        /// Maximum number of results per prefix
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Show header and trie statistics
    Stats {
        data: PathBuf,
    },
    /// Print the whole trie and result table
    Dump {
        data: PathBuf,
    },
}

/// Search data loaded for reading
enum Loaded {
    Mapped(Mmap),
    Decoded(Vec<u8>),
}

impl Loaded {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        if path.extension().is_some_and(|ext| ext == "js") {
            let script = std::io::read_to_string(file)?;
            let data = decode_script(&script)
                .with_context(|| format!("{} does not contain search data", path.display()))?;
            return Ok(Loaded::Decoded(data));
        }
        // SAFETY: the file is only read, and is not expected to change while mapped
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Loaded::Mapped(mmap))
    }

    fn bytes(&self) -> &[u8] {
        match self {
            Loaded::Mapped(mmap) => &mmap[..],
            Loaded::Decoded(data) => data.as_slice(),
        }
    }

    fn parse(&self, path: &Path) -> Result<SearchData<'_>> {
        SearchData::parse(self.bytes()).with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "searchdex=warn",
        1 => "searchdex=info",
        2 => "searchdex=debug",
        _ => "searchdex=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            entries,
            output,
            config,
            parallel,
            quiet,
        } => {
            let config = match config {
                Some(path) => IndexConfig::from_json_file(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => IndexConfig::default(),
            };
            let options = BuildOptions {
                config,
                parallel,
                quiet,
            };
            let summary = build_from_file(&entries, &output, &options)?;
            println!(
                "Indexed {} entries ({} skipped), {} bytes",
                summary.entries, summary.skipped, summary.bytes
            );
            println!("  {}", summary.binary_path.display());
            println!("  {}", summary.script_path.display());
        }
        Commands::Query {
            data,
            prefixes,
            limit,
            json,
            no_color,
        } => {
            let loaded = Loaded::open(&data)?;
            let search = loaded.parse(&data)?;
            for prefix in &prefixes {
                let mut results = search.query(prefix)?;
                results.truncate(limit);
                if json {
                    println!("{}", serde_json::to_string(&results)?);
                } else {
                    if prefixes.len() > 1 {
                        println!("{prefix}:");
                    }
                    print_results(prefix, &results, search.symbol_prefix(), !no_color)?;
                }
            }
        }
        Commands::Stats { data } => {
            let loaded = Loaded::open(&data)?;
            print!("{}", format_stats(&loaded.parse(&data)?)?);
        }
        Commands::Dump { data } => {
            let loaded = Loaded::open(&data)?;
            print!("{}", format_dump(&loaded.parse(&data)?)?);
        }
    }

    Ok(())
}
