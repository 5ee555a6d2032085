//! Line configuration loading and run construction shared between paint_cli
//! and paint_daemon.

use std::path::Path;

use anyhow::{Context, Result};
use paint_control::AlternatingFeeder;
use paint_core::{new_run_id, LineConfig, SimulationRun};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Reads a `LineConfig` from JSON and validates it.
pub fn load_config(path: impl AsRef<Path>) -> Result<LineConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: LineConfig =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating {}", path.display()))?;
    Ok(config)
}

/// Loads `path` when given, otherwise falls back to the reference line.
pub fn load_config_or_reference(path: Option<&Path>) -> Result<LineConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(LineConfig::reference()),
    }
}

/// Everything needed to drive one run from a seed.
pub struct RunSetup {
    pub run: SimulationRun,
    pub feeder: AlternatingFeeder,
    pub rng: ChaCha8Rng,
}

/// Fresh run plus a freshly generated vehicle stream. The run id and the
/// stream both come from `rng`, so a seed reproduces the whole run.
pub fn build_run(
    config: &LineConfig,
    rng: &mut ChaCha8Rng,
) -> Result<(SimulationRun, AlternatingFeeder)> {
    let id = new_run_id(rng);
    let feeder = AlternatingFeeder::generate(config, rng);
    let run = SimulationRun::new(config.clone(), id).context("building simulation run")?;
    Ok((run, feeder))
}

pub fn build_seeded_run(config: &LineConfig, seed: u64) -> Result<RunSetup> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (run, feeder) = build_run(config, &mut rng)?;
    Ok(RunSetup { run, feeder, rng })
}

/// `YYYYMMDD_HHMMSS_seed{seed}` in UTC.
pub fn generate_run_id(seed: u64) -> String {
    let now = chrono::Utc::now();
    format!("{}_seed{seed}", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reference_config_round_trips_through_file() {
        let json = serde_json::to_string_pretty(&LineConfig::reference()).unwrap();
        let file = write_config(&json);
        let loaded = load_config(file.path()).unwrap();
        assert_eq!(loaded, LineConfig::reference());
    }

    #[test]
    fn invalid_config_is_rejected_with_context() {
        let mut config = LineConfig::reference();
        config.stage2.capacity = 0;
        let file = write_config(&serde_json::to_string(&config).unwrap());
        let err = load_config(file.path()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("validating"), "{message}");
        assert!(message.contains("zero capacity"), "{message}");
    }

    #[test]
    fn malformed_json_is_rejected() {
        let file = write_config("{ not json");
        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config("/nonexistent/line.json").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/line.json"));
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let config = LineConfig::reference();
        let a = build_seeded_run(&config, 17).unwrap();
        let b = build_seeded_run(&config, 17).unwrap();
        assert_eq!(a.run.id(), b.run.id());
        assert_eq!(a.feeder, b.feeder);
        assert_eq!(a.feeder.stream().len(), 50);
    }

    #[test]
    fn shipped_line_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../content/line.json");
        let config = load_config(path).unwrap();
        assert_eq!(config, LineConfig::reference());
    }

    #[test]
    fn run_id_embeds_seed() {
        let id = generate_run_id(42);
        assert!(id.ends_with("_seed42"));
        assert_eq!(id.len(), "YYYYMMDD_HHMMSS_seed42".len());
    }
}
