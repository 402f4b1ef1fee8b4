//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level command line.
#[derive(Parser, Debug)]
#[command(name = "gemini-md-export")]
#[command(about = "Export a Gemini conversation page as Markdown", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (replaces the project config files)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the whole conversation and save it as a Markdown file
    Export(ExportArgs),
    /// Load the whole conversation and copy it to the clipboard
    Copy(CopyArgs),
    /// Answer JSON-lines requests on stdin (export, copy, cancel, ping)
    Serve(ServeArgs),
}

/// Where the conversation comes from and how it is loaded.
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Saved conversation page (HTML)
    pub page: PathBuf,

    /// Extract only what is already materialized
    #[arg(long)]
    pub no_full_load: bool,

    /// Simulate lazy pagination, materializing this many segments per load
    #[arg(long, value_name = "N")]
    pub page_size: Option<usize>,
}

/// Arguments of `export`.
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[allow(missing_docs)]
    #[command(flatten)]
    pub page: PageArgs,

    /// Directory for the exported file (overrides export.output_dir)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Arguments of `copy`.
#[derive(Args, Debug, Clone)]
pub struct CopyArgs {
    #[allow(missing_docs)]
    #[command(flatten)]
    pub page: PageArgs,
}

/// Arguments of `serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[allow(missing_docs)]
    #[command(flatten)]
    pub page: PageArgs,

    /// Directory for exported files (overrides export.output_dir)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}
