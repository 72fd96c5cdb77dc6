//! CLI module for Thợ Sửa
//!
//! Provides commands:
//! - `diagnose`: Diagnose an appliance problem from a description or photo
//! - `ask`: Ask the repair assistant a question
//! - `doctor`: Check configuration

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod ask;
pub mod diagnose;
pub mod doctor;

/// Thợ Sửa CLI
#[derive(Parser, Debug)]
#[command(name = "thosua")]
#[command(about = "AI-assisted home appliance diagnosis")]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Diagnose an appliance problem
    Diagnose(DiagnoseArgs),
    /// Ask the repair assistant a question
    Ask {
        /// Question for the assistant
        message: String,
    },
    /// Run configuration diagnostics
    Doctor,
}

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("input").required(true).args(["text", "image"])))]
pub struct DiagnoseArgs {
    /// Problem description
    #[arg(long)]
    pub text: Option<String>,

    /// Photo of the appliance (.png is sent as image/png, anything else as image/jpeg)
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Diagnose(args)) => diagnose::run(args).await,
        Some(Commands::Ask { message }) => ask::run(&message).await,
        Some(Commands::Doctor) => doctor::run().await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
