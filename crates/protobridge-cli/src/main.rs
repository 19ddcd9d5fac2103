//! protobridge CLI - TypeScript codec generator
//!
//! Commands:
//! - `protobridge generate` - Generate codec modules from a descriptor set
//! - `protobridge check` - Validate a protobridge.toml manifest

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod assemble;
mod descriptor;
mod generate;
mod manifest;

#[derive(Parser)]
#[command(name = "protobridge")]
#[command(author, version, about = "TypeScript codec generator for resolved schema descriptors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate TypeScript codec modules
    Generate {
        /// Path to the resolved descriptor set (JSON)
        #[arg(short, long)]
        schema: Option<String>,

        /// Output directory for generated modules
        #[arg(short, long)]
        out: Option<String>,

        /// Path to protobridge.toml manifest
        #[arg(short, long)]
        manifest: Option<String>,
    },

    /// Validate a protobridge.toml manifest
    Check {
        /// Path to protobridge.toml (default: ./protobridge.toml)
        #[arg(short, long)]
        manifest: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            schema,
            out,
            manifest,
        } => {
            generate::run(schema, out, manifest)?;
        }
        Commands::Check { manifest } => {
            manifest::check(manifest)?;
        }
    }

    Ok(())
}
