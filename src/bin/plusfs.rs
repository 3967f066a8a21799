//! plusfs Command-Line Front End
//!
//! Runs exactly one store command per invocation. Tokens starting with `+`
//! name paths inside the store; anything else is a host path.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use plusfs::namespace::Location;
use plusfs::{
    Command, CompactionPolicy, Config, Engine, EntryKind, LogicalPath, Output, PfsError,
    Result, SyncStrategy,
};
use tracing_subscriber::{fmt, EnvFilter};

/// plusfs CLI
#[derive(Parser, Debug)]
#[command(name = "plusfs")]
#[command(about = "Supplemental single-file store addressed by +paths")]
#[command(version)]
struct Args {
    /// Backing store file
    #[arg(short, long, default_value = "private.pfs")]
    store: PathBuf,

    /// Compaction policy: never, always, or a garbage ratio (0.0-1.0)
    #[arg(short, long, default_value = "0.5")]
    compaction: String,

    /// Maximum path depth (1 = flat namespace)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Refuse host files as cp/merge sources
    #[arg(long)]
    no_host_sources: bool,

    /// fsync after every content append
    #[arg(long)]
    sync_every_write: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy a file into the store (or a +file out to the host)
    Cp {
        /// Source (+path or host path)
        src: String,

        /// Destination (+path, or host path when the source is a +path)
        dst: String,
    },

    /// Print a stored file
    Show {
        /// The +path to print
        path: String,
    },

    /// List a stored file or directory
    Ls {
        /// The +path to list (defaults to the root)
        path: Option<String>,
    },

    /// Create a directory
    Mkdir {
        /// The +path to create
        path: String,
    },

    /// Remove an empty directory
    Rmdir {
        /// The +path to remove
        path: String,
    },

    /// Remove a file
    Rm {
        /// The +path to remove
        path: String,
    },

    /// Concatenate two files into a third
    Merge {
        /// First source (+path or host path)
        src1: String,

        /// Second source (+path or host path)
        src2: String,

        /// Destination +path
        dst: String,
    },

    /// Reclaim space held by deleted entries
    Compact,

    /// Show space usage
    Stat,
}

fn main() {
    // Initialize tracing/logging (stderr, so stdout stays file content)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,plusfs=info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("plusfs: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::builder()
        .store_path(&args.store)
        .compaction(CompactionPolicy::parse(&args.compaction)?)
        .max_depth(args.max_depth)
        .allow_host_sources(!args.no_host_sources)
        .sync_strategy(if args.sync_every_write {
            SyncStrategy::EveryWrite
        } else {
            SyncStrategy::OnRewrite
        })
        .build();

    let command = to_command(args.command)?;

    let mut engine = Engine::open(config)?;
    let output = engine.execute(command)?;

    print_output(output)
}

/// Resolve raw tokens into an engine command
fn to_command(command: Commands) -> Result<Command> {
    let command = match command {
        Commands::Cp { src, dst } => {
            let src = Location::resolve(&src)?;
            let dst = Location::resolve(&dst)?;
            match (src, dst) {
                (Location::Supplemental(src), Location::Host(dst)) => Command::Export { src, dst },
                (src, dst) => Command::Cp { src, dst },
            }
        }
        Commands::Show { path } => Command::Show {
            path: Location::supplemental(&path)?,
        },
        Commands::Ls { path } => Command::Ls {
            path: match path {
                Some(path) => Location::supplemental(&path)?,
                None => LogicalPath::root(),
            },
        },
        Commands::Mkdir { path } => Command::Mkdir {
            path: Location::supplemental(&path)?,
        },
        Commands::Rmdir { path } => Command::Rmdir {
            path: Location::supplemental(&path)?,
        },
        Commands::Rm { path } => Command::Rm {
            path: Location::supplemental(&path)?,
        },
        Commands::Merge { src1, src2, dst } => Command::Merge {
            src1: Location::resolve(&src1)?,
            src2: Location::resolve(&src2)?,
            dst: Location::resolve(&dst)?,
        },
        Commands::Compact => Command::Compact,
        Commands::Stat => Command::Stat,
    };

    Ok(command)
}

fn print_output(output: Output) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match output {
        Output::Done => {}
        Output::Content(bytes) => out.write_all(&bytes)?,
        Output::Listing(rows) => {
            for row in rows {
                let marker = match row.kind {
                    EntryKind::Directory => "/",
                    EntryKind::File => "",
                };
                writeln!(out, "{}{}\t{}\t{}", row.name, marker, row.size, row.timestamp)?;
            }
        }
        Output::Compacted(stats) => {
            writeln!(
                out,
                "purged {} entries, reclaimed {} bytes, data region {} bytes",
                stats.entries_purged, stats.bytes_reclaimed, stats.data_len
            )?;
        }
        Output::Usage(usage) => {
            writeln!(out, "active entries: {}", usage.active_entries)?;
            writeln!(out, "tombstones:     {}", usage.tombstones)?;
            writeln!(out, "data region:    {} bytes", usage.data_len)?;
            writeln!(out, "live bytes:     {}", usage.live_bytes)?;
            writeln!(out, "garbage:        {} bytes", usage.garbage_bytes())?;
        }
    }

    out.flush().map_err(PfsError::from)
}
