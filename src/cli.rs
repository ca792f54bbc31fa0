use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::server::DEFAULT_BIND_ADDRESS;

#[derive(Parser, Clone, Debug, PartialEq)]
#[command(version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Cli {
    /// JSON configuration file. Every field is optional.
    #[arg(
        short,
        long = "config",
        value_name = "FILE",
        env = "SUNCACHE_CONFIG",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    /// Cache directory. Overrides the value in the config file.
    #[arg(long, value_name = "DIR", env = "SUNCACHE_CACHE_DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum Command {
    /// Fetch missing feed images and refresh the auxiliary images.
    Populate,
    /// Serve the cache listing over HTTP.
    Serve {
        #[arg(
            long = "bind-address",
            value_name = "ADDRESS",
            env = "SUNCACHE_BIND_ADDRESS",
            default_value = DEFAULT_BIND_ADDRESS
        )]
        bind_address: String,
    },
    /// Print the cache listing as JSON.
    List,
}
