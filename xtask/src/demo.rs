//! Sample tree runner
//!
//! This module provides the `demo` subcommand, which replays the two sample
//! insertion sequences and reports the shape of the resulting trees.

use crate::{OutputFormat, TreeSelection};
use anyhow::{Context, Result, bail};
use balanced_map::tree::{RedBlackMap, TwoThreeMap};
use clap::Args;
use serde::Serialize;

const RED_BLACK_KEYS: [&str; 10] = ["S", "E", "A", "R", "C", "H", "X", "M", "P", "L"];
const TWO_THREE_KEYS: [i32; 16] = [18, 20, 10, 15, 6, 7, 8, 25, 40, 28, 66, 32, 51, 17, 23, 13];
const TWO_THREE_PROBE: i32 = 24;

/// Arguments for the demo subcommand
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Tree to build
    #[arg(long, value_enum, default_value_t = TreeSelection::All)]
    pub tree: TreeSelection,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Summary of one sample tree
#[derive(Debug, Serialize, PartialEq, Eq)]
struct DemoReport {
    tree: &'static str,
    keys: Vec<String>,
    len: usize,
    height: usize,
    black_height: Option<usize>,
    balanced: bool,
    probe: String,
    probe_value: Option<String>,
}

/// Inserts `S E A R C H X M P L`, each with value 1.
fn red_black_demo() -> Result<DemoReport> {
    let mut map = RedBlackMap::new();
    for key in RED_BLACK_KEYS {
        map.insert(key, 1);
    }
    map.validate().context("Red-black sample tree is malformed")?;

    let probe = RED_BLACK_KEYS[RED_BLACK_KEYS.len() - 1];
    Ok(DemoReport {
        tree: TreeSelection::RedBlack.label(),
        keys: RED_BLACK_KEYS.iter().map(ToString::to_string).collect(),
        len: map.len(),
        height: map.height(),
        black_height: Some(map.black_height()),
        balanced: map.is_balanced(),
        probe: probe.to_string(),
        probe_value: map.get(probe).map(ToString::to_string),
    })
}

/// Inserts the sample keys with value equal to key, then re-inserts the
/// probe key with value 1.
fn two_three_demo() -> Result<DemoReport> {
    let mut map = TwoThreeMap::new();
    for key in TWO_THREE_KEYS {
        map.insert(key, key);
    }
    map.insert(TWO_THREE_PROBE, 1);
    map.validate().context("2-3 sample tree is malformed")?;

    Ok(DemoReport {
        tree: TreeSelection::TwoThree.label(),
        keys: TWO_THREE_KEYS
            .iter()
            .chain(std::iter::once(&TWO_THREE_PROBE))
            .map(ToString::to_string)
            .collect(),
        len: map.len(),
        height: map.height(),
        black_height: None,
        balanced: map.is_balanced(),
        probe: TWO_THREE_PROBE.to_string(),
        probe_value: map.get(&TWO_THREE_PROBE).map(ToString::to_string),
    })
}

fn build_reports(selection: TreeSelection) -> Result<Vec<DemoReport>> {
    selection
        .kinds()
        .into_iter()
        .map(|kind| match kind {
            TreeSelection::RedBlack => red_black_demo(),
            TreeSelection::TwoThree => two_three_demo(),
            TreeSelection::All => bail!("Tree selection was not expanded"),
        })
        .collect()
}

fn print_text(report: &DemoReport) {
    println!("{} tree", report.tree);
    println!("  Keys:         {}", report.keys.join(" "));
    println!("  Size:         {}", report.len);
    println!("  Height:       {}", report.height);
    if let Some(black_height) = report.black_height {
        println!("  Black Height: {black_height}");
    }
    println!("  Balanced:     {}", report.balanced);
    println!(
        "  get({}):       {}",
        report.probe,
        report.probe_value.as_deref().unwrap_or("none")
    );
}

/// Run the demo subcommand
pub fn run(args: &DemoArgs) -> Result<()> {
    tracing::info!(tree = args.tree.label(), "building sample trees");
    let reports = build_reports(args.tree)?;

    match args.format {
        OutputFormat::Text => {
            for (index, report) in reports.iter().enumerate() {
                if index > 0 {
                    println!();
                }
                print_text(report);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&reports)
                .context("Failed to serialize demo reports")?;
            println!("{json}");
        }
    }

    Ok(())
}
