//! Farmstead Headless Simulation Harness
//!
//! Loads a farm description, runs it month by month and checks the
//! allocation invariants on the way: every node is accounted for each step,
//! stock is conserved against the ledger, and nobody works negative days.
//!
//! Usage:
//!   cargo run -p farmstead-simtest
//!   cargo run -p farmstead-simtest -- --scenario data/demo_farm.json --months 24 --verbose

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use farmstead_core::activities::NodeKind;
use farmstead_core::prelude::*;
use farmstead_logic::labour_units::{days_required, LabourUnitRule, LabourUnitType};
use farmstead_logic::timing::{add_months, TimerRule};

#[derive(Parser)]
#[command(name = "farmstead-simtest")]
#[command(about = "Run a farm description headless and check allocation invariants")]
struct Cli {
    /// Farm description (JSON)
    #[arg(short, long, default_value = "data/demo_farm.json")]
    scenario: PathBuf,

    /// Months to simulate
    #[arg(short, long, default_value_t = 12)]
    months: u32,

    /// Print every check and every step
    #[arg(short, long)]
    verbose: bool,

    /// Print closing balances as JSON
    #[arg(long)]
    json: bool,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("=== Farmstead Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Labour and timing rules
    results.extend(validate_labour_rules());

    // 2. Farm description
    let (scenario, config) = validate_scenario(&cli.scenario);
    results.extend(scenario);

    if let Some(config) = config {
        // 3. Monthly run
        results.extend(run_simulation(&config, cli.months, cli.verbose, cli.json));

        // 4. Save and resume
        results.extend(validate_persistence(&config, cli.months));
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || cli.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Labour and timing rules ──────────────────────────────────────────

fn validate_labour_rules() -> Vec<TestResult> {
    println!("--- Labour & Timing Rules ---");
    let mut results = Vec::new();

    let mut negative = 0;
    for unit_type in LabourUnitType::ALL {
        for quantity in [-10.0, 0.0, 0.5, 7.0, 120.0] {
            let rule = LabourUnitRule {
                unit_type,
                labour_per_unit: 2.0,
                unit_size: 10.0,
                whole_unit_blocks: true,
            };
            if days_required(&rule, quantity) < 0.0 {
                negative += 1;
            }
        }
    }
    results.push(TestResult::new(
        "labour_days_never_negative",
        negative == 0,
        format!("{} negative results over every unit type", negative),
    ));

    // A wrapping range is due for exactly its length in months
    let rule = TimerRule::MonthRange {
        start_month: 11,
        end_month: 2,
    };
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();
    let due = (0..12).filter(|&m| rule.is_due(add_months(start, m))).count();
    results.push(TestResult::new(
        "timer_wrapping_range",
        due == 4,
        format!("Nov-Feb due {} months of 12", due),
    ));

    results
}

// ── 2. Farm description ─────────────────────────────────────────────────

fn validate_scenario(path: &PathBuf) -> (Vec<TestResult>, Option<FarmConfig>) {
    println!("--- Farm Description ---");
    let mut results = Vec::new();

    let config = match FarmConfig::from_path(path) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult::new(
                "scenario_load",
                false,
                format!("{}: {}", path.display(), e),
            ));
            return (results, None);
        }
    };
    results.push(TestResult::new(
        "scenario_load",
        true,
        format!("{} from {}", config.name, path.display()),
    ));

    results.push(TestResult::new(
        "scenario_has_activities",
        !config.activities.is_empty(),
        format!("{} top-level activities", config.activities.len()),
    ));

    let people: u32 = config.labour.iter().map(|l| l.individuals).sum();
    results.push(TestResult::new(
        "scenario_has_labour",
        people > 0,
        format!("{} individuals in {} labour types", people, config.labour.len()),
    ));

    (results, Some(config))
}

// ── 3. Monthly run ──────────────────────────────────────────────────────

fn run_simulation(config: &FarmConfig, months: u32, verbose: bool, json: bool) -> Vec<TestResult> {
    println!("--- Simulation ({} months) ---", months);
    let mut results = Vec::new();

    let mut engine = match FarmEngine::from_config(config) {
        Ok(e) => e,
        Err(e) => {
            results.push(TestResult::new("engine_build", false, e.to_string()));
            return results;
        }
    };
    let opening: BTreeMap<(ResourceGroupId, String), f64> = engine
        .store
        .balances()
        .into_iter()
        .map(|(g, name, amount)| ((g, name), amount))
        .collect();

    let mut unvisited = Vec::new();
    let mut bad_shortfalls = 0;
    let mut total_shortfalls = 0;
    let mut completed = 0;
    let mut fatal = None;

    for _ in 0..months {
        let summary = match engine.step() {
            Ok(s) => s,
            Err(e) => {
                fatal = Some(e.to_string());
                break;
            }
        };
        completed += 1;

        // Every node but manual-only ones has a status after a step
        for node in engine.tree.iter() {
            let manual_only = matches!(node.allocation, AllocationStyle::Manual { trigger: None });
            if node.kind != NodeKind::Container && !manual_only && node.status.is_none() {
                unvisited.push(format!("{} {}", summary.date, node.name));
            }
        }

        for s in &summary.shortfalls {
            total_shortfalls += 1;
            if s.available > s.required || s.required <= 0.0 {
                bad_shortfalls += 1;
            }
        }

        if verbose {
            println!("  {}", summary.date.format("%Y-%m"));
            for report in &summary.performed {
                println!(
                    "    {:indent$}{} [{}]",
                    "",
                    report.name,
                    report.status,
                    indent = report.level.saturating_sub(1) * 2
                );
            }
            for s in &summary.shortfalls {
                println!(
                    "    ! {} short of {}.{}: {:.2} of {:.2}",
                    s.activity_name, s.group, s.resource, s.available, s.required
                );
            }
        }
    }

    results.push(TestResult::new(
        "run_completes",
        fatal.is_none() && completed == months,
        match &fatal {
            Some(e) => format!("stopped after {} months: {}", completed, e),
            None => format!("{} months to {}", completed, engine.date()),
        },
    ));

    results.push(TestResult::new(
        "every_node_accounted",
        unvisited.is_empty(),
        if unvisited.is_empty() {
            "every node has a status each step".to_string()
        } else {
            format!("unvisited: {}", unvisited.join(", "))
        },
    ));

    results.push(TestResult::new(
        "shortfalls_consistent",
        bad_shortfalls == 0,
        format!("{} shortfalls, {} inconsistent", total_shortfalls, bad_shortfalls),
    ));

    // Opening + gains - losses = closing, for every item
    let mut flows: BTreeMap<(ResourceGroupId, String), f64> = BTreeMap::new();
    for t in engine.store.ledger() {
        if t.group == ResourceGroupId::Labour {
            continue;
        }
        *flows.entry((t.group, t.resource.clone())).or_insert(0.0) += t.gain - t.loss;
    }
    let closing = engine.store.balances();
    let mut leaks = Vec::new();
    let mut negative = Vec::new();
    for (group, name, amount) in &closing {
        let key = (*group, name.clone());
        let expected = opening.get(&key).copied().unwrap_or(0.0)
            + flows.get(&key).copied().unwrap_or(0.0);
        if (expected - amount).abs() > 1e-6 {
            leaks.push(format!("{}.{} {:.3} vs {:.3}", group, name, amount, expected));
        }
        if *amount < 0.0 {
            negative.push(format!("{}.{}", group, name));
        }
    }
    results.push(TestResult::new(
        "stock_conserved",
        leaks.is_empty(),
        if leaks.is_empty() {
            format!("{} items balance against {} transactions", closing.len(), engine.store.ledger().len())
        } else {
            leaks.join(", ")
        },
    ));
    results.push(TestResult::new(
        "stock_never_negative",
        negative.is_empty(),
        if negative.is_empty() {
            "all balances non-negative".to_string()
        } else {
            negative.join(", ")
        },
    ));

    if let Some(pool) = engine.store.labour() {
        let overdrawn: Vec<String> = pool
            .individuals()
            .iter()
            .filter(|&&e| pool.remaining(e) < 0.0)
            .map(|&e| pool.name(e))
            .collect();
        results.push(TestResult::new(
            "labour_never_overdrawn",
            overdrawn.is_empty(),
            format!(
                "{} individuals, {:.1} days left this month",
                pool.len(),
                pool.total_remaining()
            ),
        ));
    }

    if json {
        let balances: Vec<serde_json::Value> = closing
            .iter()
            .map(|(group, name, amount)| {
                serde_json::json!({ "group": group.name(), "item": name, "amount": amount })
            })
            .collect();
        let out = serde_json::json!({
            "farm": engine.name,
            "date": engine.date().to_string(),
            "balances": balances,
        });
        match serde_json::to_string_pretty(&out) {
            Ok(text) => println!("{}", text),
            Err(e) => log::error!("Failed to encode balances: {}", e),
        }
    }

    results
}

// ── 4. Save and resume ──────────────────────────────────────────────────

fn validate_persistence(config: &FarmConfig, months: u32) -> Vec<TestResult> {
    println!("--- Save & Resume ---");
    let mut results = Vec::new();
    let half = (months / 2).max(1);

    let outcome = (|| -> Result<(bool, String), FarmError> {
        let mut original = FarmEngine::from_config(config)?;
        original.run(half)?;
        let mut bytes = Vec::new();
        original.save(&mut bytes)?;

        let mut resumed = FarmEngine::from_config(config)?;
        resumed.load(bytes.as_slice())?;
        original.run(1)?;
        resumed.run(1)?;

        let same = original.store.balances() == resumed.store.balances()
            && original.date() == resumed.date();
        Ok((
            same,
            format!("{} bytes saved after {} months", bytes.len(), half),
        ))
    })();

    match outcome {
        Ok((same, detail)) => results.push(TestResult::new("resume_matches", same, detail)),
        Err(e) => results.push(TestResult::new("resume_matches", false, e.to_string())),
    }

    results
}
