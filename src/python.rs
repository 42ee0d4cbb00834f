//! Python bindings for the DPS simulator using PyO3

use crate::config::{FightConfig, RangedFightConfig};
use crate::formulas::{crit_chance, hit_chance};
use crate::ranged::{run_ranged_and_aggregate, run_ranged_fight};
use crate::report::{format_ranged_report, format_report};
use crate::simulation::{run_and_aggregate, run_fight, MeleeSetup};
use crate::stats::{AggregatedStats, FightReport, RangedFightReport};
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use serde::de::DeserializeOwned;
use serde::Serialize;

fn parse_json<T: DeserializeOwned>(json: &str, what: &str) -> PyResult<T> {
    serde_json::from_str(json).map_err(|e| PyValueError::new_err(format!("Invalid {what} JSON: {e}")))
}

fn to_json<T: Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value)
        .map_err(|e| PyRuntimeError::new_err(format!("Failed to serialize results: {e}")))
}

fn stats_dict<'py>(py: Python<'py>, stats: &AggregatedStats) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("runs", stats.runs)?;
    dict.set_item("avg_dps", stats.avg_dps)?;
    dict.set_item("std_dps", stats.std_dps)?;
    dict.set_item("min_dps", stats.min_dps)?;
    dict.set_item("max_dps", stats.max_dps)?;
    dict.set_item("avg_total_damage", stats.avg_total_damage)?;
    dict.set_item("avg_crit_hits", stats.avg_crit_hits)?;
    dict.set_item("avg_elemental_damage", stats.avg_elemental_damage)?;
    dict.set_item("accuracy", stats.accuracy)?;
    Ok(dict)
}

/// Run one melee fight from a JSON config; returns the report as JSON
#[pyfunction]
fn run_fight_json(py: Python<'_>, config_json: &str) -> PyResult<String> {
    let config: FightConfig = parse_json(config_json, "config")?;
    let report = py
        .allow_threads(|| run_fight(&config))
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    to_json(&report)
}

/// Run one ranged fight from a JSON config; returns the report as JSON
#[pyfunction]
fn run_ranged_fight_json(py: Python<'_>, config_json: &str) -> PyResult<String> {
    let config: RangedFightConfig = parse_json(config_json, "config")?;
    let report = py
        .allow_threads(|| run_ranged_fight(&config))
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    to_json(&report)
}

/// Batch of melee (or ranged) fights; returns a dict of aggregated stats
#[pyfunction]
#[pyo3(signature = (config_json, num_sims=100, parallel=true, ranged=false))]
fn simulate(
    py: Python<'_>,
    config_json: &str,
    num_sims: usize,
    parallel: bool,
    ranged: bool,
) -> PyResult<PyObject> {
    let stats = if ranged {
        let config: RangedFightConfig = parse_json(config_json, "config")?;
        // Release GIL during computation
        py.allow_threads(|| run_ranged_and_aggregate(&config, num_sims, parallel))
    } else {
        let config: FightConfig = parse_json(config_json, "config")?;
        py.allow_threads(|| run_and_aggregate(&config, num_sims, parallel))
    }
    .map_err(|e| PyValueError::new_err(e.to_string()))?;

    Ok(stats_dict(py, &stats)?.into())
}

/// Batch from a YAML/JSON file; returns aggregated stats as JSON
#[pyfunction]
#[pyo3(signature = (config_path, num_sims, parallel=false, ranged=false))]
fn simulate_from_file(
    py: Python<'_>,
    config_path: &str,
    num_sims: usize,
    parallel: bool,
    ranged: bool,
) -> PyResult<String> {
    let load_err = |e: crate::error::ConfigError| PyIOError::new_err(format!("Failed to load config: {e}"));
    let stats = if ranged {
        let config = RangedFightConfig::from_file(config_path).map_err(load_err)?;
        py.allow_threads(|| run_ranged_and_aggregate(&config, num_sims, parallel))
    } else {
        let config = FightConfig::from_file(config_path).map_err(load_err)?;
        py.allow_threads(|| run_and_aggregate(&config, num_sims, parallel))
    }
    .map_err(|e| PyValueError::new_err(e.to_string()))?;

    to_json(&stats)
}

/// Several melee configs at once, e.g. to compare weapons
#[pyfunction]
#[pyo3(signature = (config_jsons, num_sims, parallel=false))]
fn simulate_batch(
    py: Python<'_>,
    config_jsons: Vec<String>,
    num_sims: usize,
    parallel: bool,
) -> PyResult<Vec<String>> {
    let configs = config_jsons
        .iter()
        .map(|json| parse_json::<FightConfig>(json, "config"))
        .collect::<PyResult<Vec<_>>>()?;

    let results = py.allow_threads(|| {
        configs
            .iter()
            .map(|config| run_and_aggregate(config, num_sims, parallel))
            .collect::<Result<Vec<_>, _>>()
    });
    let results = results.map_err(|e| PyValueError::new_err(e.to_string()))?;

    results.iter().map(to_json).collect()
}

/// Text report from a melee report JSON
#[pyfunction]
#[pyo3(signature = (report_json, label1=None, label2=None))]
fn format_report_json(report_json: &str, label1: Option<&str>, label2: Option<&str>) -> PyResult<String> {
    let report: FightReport = parse_json(report_json, "report")?;
    Ok(format_report(&report, label1, label2))
}

#[pyfunction]
fn format_ranged_report_json(report_json: &str) -> PyResult<String> {
    let report: RangedFightReport = parse_json(report_json, "report")?;
    Ok(format_ranged_report(&report))
}

/// Derived to-hit, rating and chances of a melee config file
#[pyfunction]
fn get_fight_diagnostics(config_path: &str) -> PyResult<String> {
    let config = FightConfig::from_file(config_path)
        .map_err(|e| PyIOError::new_err(format!("Failed to load config: {e}")))?;
    let setup = MeleeSetup::new(&config).map_err(|e| PyValueError::new_err(e.to_string()))?;

    let stats = serde_json::json!({
        "to_hit": setup.offense.to_hit,
        "offense_rating": setup.offense.offense_rating,
        "displayed_attack": setup.offense.displayed_attack(),
        "avoidance": setup.avoidance,
        "mitigation": setup.mitigation,
        "hit_chance": hit_chance(setup.offense.to_hit, setup.avoidance),
        "crit_chance": crit_chance(&setup.crit, 0.0),
        "damage_bonus": setup.damage_bonus,
        "delay1": setup.delay1,
        "delay2": setup.delay2,
        "dual_wielding": setup.dual_wielding,
        "proc_chance1": setup.proc_chance1,
        "proc_chance2": setup.proc_chance2,
        "special": setup.special.as_ref().map(|s| s.name.clone()),
        "fistweaving": setup.fistweaving,
    });
    Ok(stats.to_string())
}

/// Get number of threads being used for parallel simulation
#[pyfunction]
fn get_thread_count() -> PyResult<usize> {
    Ok(rayon::current_num_threads())
}

/// Get number of available CPU cores
#[pyfunction]
fn get_available_cores() -> PyResult<usize> {
    Ok(num_cpus::get())
}

/// Python module definition
#[pymodule]
fn dps_sim(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(run_fight_json, m)?)?;
    m.add_function(wrap_pyfunction!(run_ranged_fight_json, m)?)?;
    m.add_function(wrap_pyfunction!(simulate, m)?)?;
    m.add_function(wrap_pyfunction!(simulate_from_file, m)?)?;
    m.add_function(wrap_pyfunction!(simulate_batch, m)?)?;
    m.add_function(wrap_pyfunction!(format_report_json, m)?)?;
    m.add_function(wrap_pyfunction!(format_ranged_report_json, m)?)?;
    m.add_function(wrap_pyfunction!(get_fight_diagnostics, m)?)?;
    m.add_function(wrap_pyfunction!(get_thread_count, m)?)?;
    m.add_function(wrap_pyfunction!(get_available_cores, m)?)?;
    Ok(())
}
