//! Command-line flags
//!
//! Only startup concerns live here; everything else comes from the config file
//! and the environment.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "title_viewer",
    version,
    about = "Serves the civil service title dataset, its PDFs and the viewer frontend"
)]
pub struct Cli {
    /// Config file path without extension
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// Listen host, overrides `server.host`
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port, overrides `server.port`
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Tokio worker threads, overrides `server.workers`
    #[arg(long)]
    pub workers: Option<usize>,

    /// Log every request with its resolved route
    #[arg(long)]
    pub debug: bool,
}
