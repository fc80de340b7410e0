//! Scenario-driven stress runner
//!
//! This module provides the `stress` subcommand. A scenario YAML file lists
//! insertion workloads; each one is replayed against the selected trees, after
//! which every invariant is validated and every key is looked up.

use crate::{OutputFormat, TreeSelection};
use anyhow::{Context, Result, bail};
use balanced_map::tree::{BalancedMap, RedBlackMap, TwoThreeMap};
use clap::Args;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Seed used when neither the CLI nor the scenario provides one
const DEFAULT_SEED: u64 = 42;

/// Number of keys beyond the inserted range that must be absent
const ABSENT_PROBES: u64 = 1024;

/// Arguments for the stress subcommand
#[derive(Args, Debug)]
pub struct StressArgs {
    /// Scenario YAML file path
    #[arg(long, short = 's', default_value = "xtask/scenarios/default.yaml")]
    pub scenario: PathBuf,

    /// Override key count of every run
    #[arg(long)]
    pub count: Option<usize>,

    /// Override random seed of every run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override tree selection of every run
    #[arg(long, value_enum)]
    pub tree: Option<TreeSelection>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Scenario configuration from YAML
#[derive(Debug, Deserialize)]
struct ScenarioConfig {
    name: Option<String>,
    seed: Option<u64>,
    runs: Vec<RunConfig>,
}

/// One workload of a scenario
#[derive(Debug, Clone, Deserialize)]
struct RunConfig {
    name: Option<String>,
    #[serde(default = "default_tree")]
    tree: TreeSelection,
    count: usize,
    #[serde(default)]
    order: KeyOrder,
    seed: Option<u64>,
    /// Insert every key a second time with a new value
    #[serde(default)]
    reinsert: bool,
}

const fn default_tree() -> TreeSelection {
    TreeSelection::All
}

/// Order in which keys `0..count` are inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum KeyOrder {
    Ascending,
    Descending,
    #[default]
    Shuffled,
}

/// A run with CLI overrides applied and its tree selection expanded
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedRun {
    name: String,
    tree: TreeSelection,
    count: usize,
    order: KeyOrder,
    seed: u64,
    reinsert: bool,
}

/// Outcome of one resolved run
#[derive(Debug, Serialize)]
struct RunReport {
    name: String,
    tree: &'static str,
    count: usize,
    order: KeyOrder,
    seed: u64,
    len: usize,
    height: usize,
    elapsed_ms: u128,
    missing: usize,
    unexpected: usize,
    stale_replacements: usize,
    violation: Option<String>,
    passed: bool,
}

/// Apply CLI overrides to scenario runs.
///
/// Priority: CLI > run entry > scenario > default
fn resolve_runs(args: &StressArgs, scenario: &ScenarioConfig) -> Vec<ResolvedRun> {
    scenario
        .runs
        .iter()
        .enumerate()
        .flat_map(|(index, run)| {
            let selection = args.tree.unwrap_or(run.tree);
            let name = run
                .name
                .clone()
                .unwrap_or_else(|| format!("run-{}", index + 1));
            let count = args.count.unwrap_or(run.count);
            let seed = args
                .seed
                .or(run.seed)
                .or(scenario.seed)
                .unwrap_or(DEFAULT_SEED);
            selection.kinds().into_iter().map(move |tree| ResolvedRun {
                name: name.clone(),
                tree,
                count,
                order: run.order,
                seed,
                reinsert: run.reinsert,
            })
        })
        .collect()
}

fn generate_keys(count: usize, order: KeyOrder, seed: u64) -> Vec<u64> {
    let mut keys: Vec<u64> = (0..count as u64).collect();
    match order {
        KeyOrder::Ascending => {}
        KeyOrder::Descending => keys.reverse(),
        KeyOrder::Shuffled => keys.shuffle(&mut StdRng::seed_from_u64(seed)),
    }
    keys
}

/// Builds a map of type `M` from `keys` and checks it.
fn exercise<M: BalancedMap<u64, u64> + Default>(run: &ResolvedRun, keys: &[u64]) -> RunReport {
    let started = Instant::now();
    let mut map = M::default();
    for &key in keys {
        map.insert(key, key * 2);
    }

    let mut stale_replacements = 0;
    if run.reinsert {
        for &key in keys {
            if map.insert(key, key * 3) != Some(key * 2) {
                stale_replacements += 1;
            }
        }
    }
    let elapsed_ms = started.elapsed().as_millis();

    let factor = if run.reinsert { 3 } else { 2 };
    let missing = keys
        .iter()
        .filter(|&&key| map.get(&key) != Some(&(key * factor)))
        .count();
    let inserted = keys.len() as u64;
    let unexpected = (inserted..inserted + ABSENT_PROBES)
        .filter(|key| map.contains_key(key))
        .count();
    let violation = map.validate().err().map(|violation| violation.to_string());
    let len = map.len();

    let passed = violation.is_none()
        && missing == 0
        && unexpected == 0
        && stale_replacements == 0
        && len == keys.len();

    RunReport {
        name: run.name.clone(),
        tree: run.tree.label(),
        count: run.count,
        order: run.order,
        seed: run.seed,
        len,
        height: map.height(),
        elapsed_ms,
        missing,
        unexpected,
        stale_replacements,
        violation,
        passed,
    }
}

fn execute(run: &ResolvedRun) -> Result<RunReport> {
    let keys = generate_keys(run.count, run.order, run.seed);
    tracing::info!(
        name = %run.name,
        tree = run.tree.label(),
        count = run.count,
        order = ?run.order,
        "starting stress run"
    );

    let report = match run.tree {
        TreeSelection::RedBlack => exercise::<RedBlackMap<u64, u64>>(run, &keys),
        TreeSelection::TwoThree => exercise::<TwoThreeMap<u64, u64>>(run, &keys),
        TreeSelection::All => bail!("Tree selection was not expanded for run {}", run.name),
    };

    if !report.passed {
        tracing::warn!(
            name = %report.name,
            tree = report.tree,
            missing = report.missing,
            unexpected = report.unexpected,
            violation = report.violation.as_deref().unwrap_or("none"),
            "stress run failed"
        );
    }
    Ok(report)
}

/// Get the project root directory
fn project_root() -> PathBuf {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").map_or_else(|_| PathBuf::from("."), PathBuf::from);

    // xtask is in project_root/xtask, so go up one level
    if manifest_dir.ends_with("xtask") {
        manifest_dir
            .parent()
            .map_or_else(|| manifest_dir.clone(), Path::to_path_buf)
    } else {
        manifest_dir
    }
}

fn load_scenario(path: &Path) -> Result<ScenarioConfig> {
    let content = fs::read_to_string(path).context("Failed to read scenario file")?;
    let scenario: ScenarioConfig =
        serde_yaml::from_str(&content).context("Failed to parse scenario YAML")?;
    if scenario.runs.is_empty() {
        bail!("Scenario has no runs: {}", path.display());
    }
    Ok(scenario)
}

fn print_text(scenario_path: &Path, scenario: &ScenarioConfig, reports: &[RunReport]) {
    eprintln!("==============================================");
    eprintln!("  Balanced Map Stress Runner (xtask)");
    eprintln!("==============================================");
    eprintln!();
    eprintln!("  Scenario: {}", scenario_path.display());
    if let Some(name) = &scenario.name {
        eprintln!("  Name:     {name}");
    }
    eprintln!();

    println!(
        "{:<20} {:<10} {:>8} {:<10} {:>6} {:>10}  result",
        "run", "tree", "count", "order", "height", "elapsed"
    );
    for report in reports {
        let result = if report.passed {
            "ok".to_string()
        } else {
            report
                .violation
                .clone()
                .unwrap_or_else(|| {
                    format!(
                        "FAILED (missing {}, unexpected {}, stale {}, len {})",
                        report.missing, report.unexpected, report.stale_replacements, report.len
                    )
                })
        };
        println!(
            "{:<20} {:<10} {:>8} {:<10} {:>6} {:>8}ms  {}",
            report.name,
            report.tree,
            report.count,
            format!("{:?}", report.order).to_lowercase(),
            report.height,
            report.elapsed_ms,
            result
        );
    }
}

/// Run the stress subcommand
pub fn run(args: &StressArgs) -> Result<()> {
    // Resolve scenario path relative to project root if not found as given
    let scenario_path = if args.scenario.is_absolute() || args.scenario.exists() {
        args.scenario.clone()
    } else {
        project_root().join(&args.scenario)
    };
    if !scenario_path.exists() {
        bail!("Scenario file not found: {}", scenario_path.display());
    }

    let scenario = load_scenario(&scenario_path)?;
    let runs = resolve_runs(args, &scenario);
    let reports = runs.iter().map(execute).collect::<Result<Vec<_>>>()?;

    match args.format {
        OutputFormat::Text => print_text(&scenario_path, &scenario, &reports),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&reports)
                .context("Failed to serialize stress reports")?;
            println!("{json}");
        }
    }

    let failed = reports.iter().filter(|report| !report.passed).count();
    if failed > 0 {
        bail!("{failed} of {} stress runs failed", reports.len());
    }
    tracing::info!(runs = reports.len(), "all stress runs passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SCENARIO: &str = r"
name: sample
seed: 7
runs:
  - name: sorted
    tree: red-black
    count: 50
    order: ascending
  - count: 20
    reinsert: true
";

    fn args() -> StressArgs {
        StressArgs {
            scenario: PathBuf::from("unused.yaml"),
            count: None,
            seed: None,
            tree: None,
            format: OutputFormat::Text,
        }
    }

    fn run_of(tree: TreeSelection, count: usize, order: KeyOrder, reinsert: bool) -> ResolvedRun {
        ResolvedRun {
            name: "test".to_string(),
            tree,
            count,
            order,
            seed: 3,
            reinsert,
        }
    }

    #[rstest]
    fn test_scenario_parses_with_defaults() {
        let scenario: ScenarioConfig = serde_yaml::from_str(SCENARIO).unwrap();
        assert_eq!(scenario.name.as_deref(), Some("sample"));
        assert_eq!(scenario.runs.len(), 2);
        assert_eq!(scenario.runs[0].tree, TreeSelection::RedBlack);
        assert_eq!(scenario.runs[0].order, KeyOrder::Ascending);
        assert_eq!(scenario.runs[1].tree, TreeSelection::All);
        assert_eq!(scenario.runs[1].order, KeyOrder::Shuffled);
        assert!(scenario.runs[1].reinsert);
    }

    #[rstest]
    fn test_resolve_runs_expands_all_and_inherits_seed() {
        let scenario: ScenarioConfig = serde_yaml::from_str(SCENARIO).unwrap();
        let runs = resolve_runs(&args(), &scenario);

        let summary: Vec<(&str, TreeSelection, u64)> = runs
            .iter()
            .map(|run| (run.name.as_str(), run.tree, run.seed))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("sorted", TreeSelection::RedBlack, 7),
                ("run-2", TreeSelection::RedBlack, 7),
                ("run-2", TreeSelection::TwoThree, 7),
            ]
        );
    }

    #[rstest]
    fn test_cli_overrides_take_priority() {
        let scenario: ScenarioConfig = serde_yaml::from_str(SCENARIO).unwrap();
        let overrides = StressArgs {
            count: Some(5),
            seed: Some(99),
            tree: Some(TreeSelection::TwoThree),
            ..args()
        };
        let runs = resolve_runs(&overrides, &scenario);

        assert_eq!(runs.len(), 2);
        assert!(runs.iter().all(|run| run.count == 5
            && run.seed == 99
            && run.tree == TreeSelection::TwoThree));
    }

    #[rstest]
    #[case(KeyOrder::Ascending, vec![0, 1, 2, 3, 4])]
    #[case(KeyOrder::Descending, vec![4, 3, 2, 1, 0])]
    fn test_generate_keys_in_order(#[case] order: KeyOrder, #[case] expected: Vec<u64>) {
        assert_eq!(generate_keys(5, order, 0), expected);
    }

    #[rstest]
    fn test_generate_keys_shuffled_is_seeded_permutation() {
        let first = generate_keys(100, KeyOrder::Shuffled, 11);
        let second = generate_keys(100, KeyOrder::Shuffled, 11);
        assert_eq!(first, second);

        let mut sorted = first;
        sorted.sort_unstable();
        assert_eq!(sorted, (0..100).collect::<Vec<u64>>());
    }

    #[rstest]
    #[case(TreeSelection::RedBlack, KeyOrder::Ascending, false)]
    #[case(TreeSelection::RedBlack, KeyOrder::Shuffled, true)]
    #[case(TreeSelection::TwoThree, KeyOrder::Descending, false)]
    #[case(TreeSelection::TwoThree, KeyOrder::Shuffled, true)]
    fn test_execute_passes(
        #[case] tree: TreeSelection,
        #[case] order: KeyOrder,
        #[case] reinsert: bool,
    ) {
        let report = execute(&run_of(tree, 500, order, reinsert)).unwrap();
        assert!(report.passed, "{report:?}");
        assert_eq!(report.len, 500);
        assert_eq!(report.missing, 0);
        assert_eq!(report.unexpected, 0);
    }

    #[rstest]
    fn test_execute_rejects_unexpanded_selection() {
        let result = execute(&run_of(TreeSelection::All, 1, KeyOrder::Ascending, false));
        assert!(result.is_err());
    }

    #[rstest]
    fn test_load_scenario_rejects_missing_file() {
        let result = load_scenario(Path::new("does/not/exist.yaml"));
        assert!(result.is_err());
    }

    #[rstest]
    fn test_default_scenario_is_valid() {
        let path = project_root().join("xtask/scenarios/default.yaml");
        let scenario = load_scenario(&path).unwrap();
        assert!(scenario.runs.iter().all(|run| run.count > 0));
    }
}
