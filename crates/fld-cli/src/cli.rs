use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "fielder",
    about = "Fielder: named values kept in a durable local log",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log file to use (overrides the settings file)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// TOML settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List all fields in insertion order
    List(ListArgs),
    /// Show one field (name matched ignoring case)
    Get(GetArgs),
    /// Add a new field
    Add(AddArgs),
    /// Remove a field by its exact name
    Remove(RemoveArgs),
    /// Load the log and report what was found
    Check(CheckArgs),
}

#[derive(Args)]
pub struct ListArgs {}

#[derive(Args)]
pub struct GetArgs {
    pub name: String,
}

#[derive(Args)]
pub struct AddArgs {
    pub name: String,
    pub value: String,
    #[arg(short = 'm', long)]
    pub comment: Option<String>,
}

#[derive(Args)]
pub struct RemoveArgs {
    pub name: String,
}

#[derive(Args)]
pub struct CheckArgs {}
