//! xtask - Development task runner for balanced-map
//!
//! Usage:
//!   cargo xtask demo [--tree red-black|two-three|all] [--format text|json]
//!   cargo xtask stress [--scenario <yaml>] [options]

mod demo;
mod stress;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development task runner for balanced-map")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the sample insertion sequences and report the resulting trees
    Demo(demo::DemoArgs),
    /// Run scenario-driven insertion workloads and check every invariant
    Stress(stress::StressArgs),
}

/// Which tree a command operates on
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TreeSelection {
    /// Left-leaning red-black tree
    RedBlack,
    /// 2-3 tree
    TwoThree,
    /// Both trees, one after the other
    All,
}

impl TreeSelection {
    /// Expands `All` into the concrete tree kinds
    pub fn kinds(self) -> Vec<Self> {
        match self {
            Self::All => vec![Self::RedBlack, Self::TwoThree],
            kind => vec![kind],
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::RedBlack => "red-black",
            Self::TwoThree => "two-three",
            Self::All => "all",
        }
    }
}

/// Report output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xtask=info,balanced_map=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Demo(args) => demo::run(&args),
        Commands::Stress(args) => stress::run(&args),
    }
}
