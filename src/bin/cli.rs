//! LodeKV CLI
//!
//! One-shot commands and an interactive console over a local journal.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lodekv::journal::Journal;
use lodekv::{console, Config, EngineKind, JournalSyncStrategy, LodeError, Store, UpdatePolicy};
use tracing_subscriber::{fmt, EnvFilter};

/// LodeKV CLI
#[derive(Parser, Debug)]
#[command(name = "lodekv")]
#[command(about = "Embedded key-value store with pluggable index engines")]
#[command(version)]
struct Args {
    /// Journal file
    #[arg(short, long, default_value = "./lodekv.journal")]
    journal: PathBuf,

    /// Index engine: hashMap, bTreeMap, sortedArrayMap or map
    #[arg(short, long, default_value = "bTreeMap")]
    engine: EngineKind,

    /// Fsync the journal every N appends instead of after each one
    #[arg(long)]
    sync_every: Option<usize>,

    /// Make `update` fail on keys that do not exist
    #[arg(long)]
    strict_update: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        #[arg(default_value = "")]
        value: String,
    },

    /// Overwrite a key-value pair
    Update {
        /// The key to update
        key: String,

        /// The new value
        #[arg(default_value = "")]
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Start an interactive console
    Console,

    /// Check the journal without loading it
    Verify,
}

fn main() -> ExitCode {
    // Logs go to stderr so command output stays clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(LodeError::KeyNotFound) => {
            eprintln!("(not found)");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> lodekv::Result<()> {
    if let Commands::Verify = args.command {
        let stats = Journal::verify(&args.journal)?;
        println!(
            "{}: {} records ({} set, {} update, {} delete)",
            args.journal.display(),
            stats.records,
            stats.sets,
            stats.updates,
            stats.deletes
        );
        return Ok(());
    }

    let sync_strategy = match args.sync_every {
        Some(count) => JournalSyncStrategy::EveryNEntries { count },
        None => JournalSyncStrategy::EveryWrite,
    };
    let update_policy = if args.strict_update {
        UpdatePolicy::RequireExisting
    } else {
        UpdatePolicy::Upsert
    };

    let config = Config::builder()
        .journal_path(&args.journal)
        .engine(args.engine)
        .journal_sync_strategy(sync_strategy)
        .update_policy(update_policy)
        .build();

    let store = Store::open(config)?;
    tracing::info!("LodeKV v{} using {} engine", lodekv::VERSION, store.engine_kind());

    match args.command {
        Commands::Get { key } => {
            let value = store.get(key.as_bytes())?;
            println!("{}", String::from_utf8_lossy(&value));
        }
        Commands::Set { key, value } => {
            store.set(key.as_bytes(), value.as_bytes())?;
            println!("OK");
        }
        Commands::Update { key, value } => {
            store.update(key.as_bytes(), value.as_bytes())?;
            println!("OK");
        }
        Commands::Del { key } => {
            store.delete(key.as_bytes())?;
            println!("OK");
        }
        Commands::Console => {
            let stdin = io::stdin();
            console::run(&store, stdin.lock(), io::stdout())?;
        }
        Commands::Verify => {}
    }

    store.close()
}
