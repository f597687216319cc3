use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "greeksd")]
#[command(about = "Options Greeks poller and WebSocket stream")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start polling and serving Greeks
    Start {
        /// YAML configuration file; environment variables are used when omitted
        #[arg(short, long, env = "GREEKS_CONFIG")]
        config: Option<PathBuf>,

        /// Override HTTP port
        #[arg(long)]
        http: Option<u16>,

        /// Override WebSocket port
        #[arg(long)]
        ws: Option<u16>,
    },

    /// Validate configuration without starting
    Validate {
        /// YAML configuration file; environment variables are used when omitted
        #[arg(short, long, env = "GREEKS_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Write a configuration file with every default filled in
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "greeks.yaml")]
        output: PathBuf,
    },

    /// Decode contract identifiers and print their parts
    Decode {
        /// Identifiers such as AAPL240920C00175000
        #[arg(required = true)]
        symbols: Vec<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
