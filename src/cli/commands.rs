//! CLI command implementations
//!
//! Each workload returns a JSON report; `run_command` writes it to stdout as
//! a single `{"status": "ok", "data": ...}` line. Log lines go to stderr, so
//! stdout carries nothing else.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use crate::index::{AvlTree, IndexError, ProbingConfig, ProbingIndex};
use crate::observability::{Timer, WorkloadScope};

use super::args::{Command, IndexKind};
use super::errors::{CliError, CliResult};

/// Dispatch a parsed command and write its report to stdout
pub fn run_command(command: Command) -> CliResult<()> {
    run_command_to(command, &mut io::stdout())
}

/// Dispatch a parsed command and write its report to `out`
pub fn run_command_to<W: Write>(command: Command, out: &mut W) -> CliResult<()> {
    let report = match command {
        Command::Bench {
            index,
            keys,
            config,
            shuffle,
            seed,
        } => {
            let config = load_config(config.as_deref())?;
            bench(index, keys, config, shuffle.then_some(seed))?
        }
        Command::Stress {
            index,
            keys,
            ops,
            config,
            seed,
        } => {
            let config = load_config(config.as_deref())?;
            stress(index, keys, ops, config, seed)?
        }
    };
    write_response(out, report)
}

fn load_config(path: Option<&Path>) -> CliResult<ProbingConfig> {
    match path {
        Some(path) => Ok(ProbingConfig::load(path)?),
        None => Ok(ProbingConfig::default()),
    }
}

/// Write a success response as one JSON line
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    let response = json!({
        "status": "ok",
        "data": data
    });

    serde_json::to_writer(&mut *out, &response)?;
    writeln!(out)?;
    out.flush()?;

    Ok(())
}

/// Insert `keys` keys, then look every one of them up.
///
/// With `shuffle_seed` the insertion order is a seeded permutation. The
/// `baseline` section times the std structures each index replaces on the
/// same order: `HashMap` next to the probing index, a `Vec` searched with
/// `contains` next to the AVL tree.
pub fn bench(
    kind: IndexKind,
    keys: usize,
    config: ProbingConfig,
    shuffle_seed: Option<u64>,
) -> CliResult<Value> {
    let mut order: Vec<usize> = (0..keys).collect();
    if let Some(seed) = shuffle_seed {
        order.shuffle(&mut StdRng::seed_from_u64(seed));
    }

    let mut report = serde_json::Map::new();
    if kind.includes_avl() {
        report.insert("avl".to_string(), bench_avl(&order)?);
    }
    if kind.includes_probing() {
        report.insert("probing".to_string(), bench_probing(&order, config)?);
    }
    report.insert("baseline".to_string(), bench_baseline(kind, &order));
    Ok(Value::Object(report))
}

fn bench_baseline(kind: IndexKind, order: &[usize]) -> Value {
    let mut baseline = serde_json::Map::new();

    if kind.includes_avl() {
        let timer = Timer::new();
        let mut list = Vec::with_capacity(order.len());
        for &k in order {
            list.push(k);
        }
        let insert_secs = timer.elapsed_secs();

        let timer = Timer::new();
        let found = order.iter().filter(|k| list.contains(k)).count();
        let lookup_secs = timer.elapsed_secs();

        baseline.insert(
            "vec_scan".to_string(),
            json!({
                "keys": found,
                "insert_secs": insert_secs,
                "lookup_secs": lookup_secs,
            }),
        );
    }

    if kind.includes_probing() {
        let names: Vec<String> = order.iter().map(|k| format!("product_{}", k)).collect();

        let timer = Timer::new();
        let mut map = HashMap::new();
        for (name, &k) in names.iter().zip(order) {
            map.insert(name.clone(), k);
        }
        let insert_secs = timer.elapsed_secs();

        let timer = Timer::new();
        let found = names.iter().filter(|name| map.contains_key(name.as_str())).count();
        let lookup_secs = timer.elapsed_secs();

        baseline.insert(
            "hashmap".to_string(),
            json!({
                "keys": found,
                "insert_secs": insert_secs,
                "lookup_secs": lookup_secs,
            }),
        );
    }

    Value::Object(baseline)
}

fn bench_avl(order: &[usize]) -> CliResult<Value> {
    let scope = WorkloadScope::new("bench", "avl");
    let mut tree = AvlTree::new();

    let timer = Timer::new();
    for &k in order {
        tree.insert(k, k);
    }
    let insert_secs = timer.elapsed_secs();

    let timer = Timer::new();
    for &k in order {
        if tree.search(&k) != Some(&k) {
            scope.fail("lookup missed an inserted key");
            return Err(IndexError::InvariantViolated(format!("avl lost key {}", k)).into());
        }
    }
    let lookup_secs = timer.elapsed_secs();

    scope.complete(&[("keys", &order.len().to_string())]);
    Ok(json!({
        "keys": order.len(),
        "insert_secs": insert_secs,
        "lookup_secs": lookup_secs,
        "height": tree.height(),
        "metrics": tree.metrics(),
    }))
}

fn bench_probing(order: &[usize], config: ProbingConfig) -> CliResult<Value> {
    let scope = WorkloadScope::new("bench", "probing");
    let mut table = ProbingIndex::with_config(config)?;
    let names: Vec<String> = order.iter().map(|k| format!("product_{}", k)).collect();

    let timer = Timer::new();
    for (name, &k) in names.iter().zip(order) {
        table.insert(name.clone(), k);
    }
    let insert_secs = timer.elapsed_secs();

    let timer = Timer::new();
    for (name, &k) in names.iter().zip(order) {
        if table.get(name.as_str()) != Some(&k) {
            scope.fail("lookup missed an inserted key");
            return Err(IndexError::InvariantViolated(format!("probing lost key {}", name)).into());
        }
    }
    let lookup_secs = timer.elapsed_secs();

    scope.complete(&[("keys", &order.len().to_string())]);
    Ok(json!({
        "keys": order.len(),
        "insert_secs": insert_secs,
        "lookup_secs": lookup_secs,
        "capacity": table.capacity(),
        "load_factor": table.load_factor(),
        "metrics": table.metrics(),
    }))
}

/// One step of a randomized workload
#[derive(Debug, Clone, Copy)]
enum Op {
    Insert(usize, u64),
    Delete(usize),
    Lookup(usize),
}

fn random_ops(key_space: usize, ops: usize, seed: u64) -> Vec<Op> {
    let mut rng = StdRng::seed_from_u64(seed);
    let key_space = key_space.max(1);
    (0..ops)
        .map(|_| {
            let key = rng.gen_range(0..key_space);
            match rng.gen_range(0..100) {
                0..=49 => Op::Insert(key, rng.gen()),
                50..=69 => Op::Delete(key),
                _ => Op::Lookup(key),
            }
        })
        .collect()
}

/// Run a seeded operation mix against each selected index and a
/// `std::collections` model, failing on the first divergence.
pub fn stress(
    kind: IndexKind,
    key_space: usize,
    ops: usize,
    config: ProbingConfig,
    seed: u64,
) -> CliResult<Value> {
    let plan = random_ops(key_space, ops, seed);

    let mut report = serde_json::Map::new();
    if kind.includes_avl() {
        report.insert("avl".to_string(), stress_avl(&plan)?);
    }
    if kind.includes_probing() {
        report.insert("probing".to_string(), stress_probing(&plan, config)?);
    }
    Ok(Value::Object(report))
}

fn diverged(scope: WorkloadScope<'_>, step: usize, what: &str) -> CliError {
    let reason = format!("step {}: {}", step, what);
    scope.fail(&reason);
    IndexError::InvariantViolated(reason).into()
}

fn stress_avl(plan: &[Op]) -> CliResult<Value> {
    let scope = WorkloadScope::new("stress", "avl");
    let mut tree = AvlTree::new();
    let mut model = BTreeMap::new();
    let timer = Timer::new();

    for (step, op) in plan.iter().enumerate() {
        let agrees = match *op {
            Op::Insert(k, v) => tree.insert(k, v) == model.insert(k, v),
            Op::Delete(k) => tree.delete(&k) == model.remove(&k),
            Op::Lookup(k) => tree.search(&k) == model.get(&k),
        };
        if !agrees {
            return Err(diverged(scope, step, &format!("{:?} disagrees with model", op)));
        }
        if step % 1000 == 0 {
            if let Err(e) = tree.check_invariants() {
                return Err(diverged(scope, step, e.message()));
            }
        }
    }

    if let Err(e) = tree.check_invariants() {
        return Err(diverged(scope, plan.len(), e.message()));
    }
    let in_order: Vec<(usize, u64)> = tree.in_order().into_iter().map(|(k, v)| (*k, *v)).collect();
    let expected: Vec<(usize, u64)> = model.into_iter().collect();
    if in_order != expected {
        return Err(diverged(scope, plan.len(), "final contents differ from model"));
    }

    let elapsed = timer.elapsed_secs();
    scope.complete(&[("ops", &plan.len().to_string())]);
    Ok(json!({
        "ops": plan.len(),
        "final_len": tree.len(),
        "height": tree.height(),
        "elapsed_secs": elapsed,
        "metrics": tree.metrics(),
    }))
}

fn stress_probing(plan: &[Op], config: ProbingConfig) -> CliResult<Value> {
    let scope = WorkloadScope::new("stress", "probing");
    let mut table = ProbingIndex::with_config(config)?;
    let mut model = HashMap::new();
    let timer = Timer::new();

    for (step, op) in plan.iter().enumerate() {
        let agrees = match *op {
            Op::Insert(k, v) => table.insert(k, v) == model.insert(k, v),
            Op::Delete(k) => table.delete(&k) == model.remove(&k).is_some(),
            Op::Lookup(k) => table.get(&k) == model.get(&k),
        };
        if !agrees {
            return Err(diverged(scope, step, &format!("{:?} disagrees with model", op)));
        }
        if table.size() != model.len() {
            return Err(diverged(scope, step, "size differs from model"));
        }
    }

    for (k, v) in &model {
        if table.get(k) != Some(v) {
            return Err(diverged(scope, plan.len(), "final contents differ from model"));
        }
    }

    let elapsed = timer.elapsed_secs();
    scope.complete(&[("ops", &plan.len().to_string())]);
    Ok(json!({
        "ops": plan.len(),
        "final_size": table.size(),
        "capacity": table.capacity(),
        "tombstones": table.tombstones(),
        "elapsed_secs": elapsed,
        "metrics": table.metrics(),
    }))
}
