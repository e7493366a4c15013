use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::chuck_client::{ClientConfig, DEFAULT_API_BASE};
use crate::jokes_feed::FeedSettings;
use crate::list_rules::ROLLING_LIST_CAPACITY;

#[derive(Debug, Clone, Parser)]
#[command(name = "chuck-jokes-reader", version, about = "Random Chuck Norris jokes with persistent favorites")]
pub struct Args {
    /// Base URL of the joke API
    #[arg(long, env = "CHUCK_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Seconds between timed refreshes
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub refresh_secs: u64,

    /// Jokes fetched on startup and on "Refresh"
    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Directory for storage.db (defaults to ~/.chuck_jokes)
    #[arg(long, env = "CHUCK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep favorites in memory only for this session
    #[arg(long, conflicts_with = "no_storage")]
    pub ephemeral: bool,

    /// Run without any favorites storage
    #[arg(long)]
    pub no_storage: bool,

    /// How often to check for favorites changed by another window
    #[arg(long, default_value_t = 1000)]
    pub watch_interval_ms: u64,

    /// Append debug logs to this file
    #[arg(long, env = "CHUCK_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    DefaultDir,
    Dir(PathBuf),
    Memory,
    Disabled,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub feed: FeedSettings,
    pub storage: StorageLocation,
    pub watch_interval: Duration,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_args(args: Args) -> Self {
        let storage = if args.no_storage {
            StorageLocation::Disabled
        } else if args.ephemeral {
            StorageLocation::Memory
        } else if let Some(dir) = args.data_dir {
            StorageLocation::Dir(dir)
        } else {
            StorageLocation::DefaultDir
        };

        Self {
            client: ClientConfig {
                api_base: args.api_base,
                request_timeout: Duration::from_secs(args.request_timeout_secs),
            },
            feed: FeedSettings {
                batch_size: args.batch_size,
                capacity: ROLLING_LIST_CAPACITY,
                refresh_interval: Duration::from_secs(args.refresh_secs),
            },
            storage,
            watch_interval: Duration::from_millis(args.watch_interval_ms.max(50)),
            log_file: args.log_file,
        }
    }
}
