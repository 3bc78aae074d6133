//! Configuration file – reads/writes `~/.turret/config.toml`.
//!
//! Every section and field is optional; anything missing takes its default.
//! After parsing, `TURRET_*` environment variables override individual
//! fields.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use turret_hal::{CameraConfig, LinkConfig};
use turret_perception::DetectorConfig;
use turret_runtime::{ControllerConfig, TurretLoopConfig};
use turret_types::TurretError;

/// Where frames come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory of still images replayed as the camera.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_dir: Option<PathBuf>,
    /// Restart from the first frame when the directory is exhausted.
    pub looping: bool,
    /// End the run after this many ticks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<u64>,
}

/// Telemetry outputs besides the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Directory for annotated frame snapshots.  Unset disables snapshots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_dir: Option<PathBuf>,
    /// Keep every N-th frame, plus every frame that sent a command.
    pub snapshot_every: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: None,
            snapshot_every: 30,
        }
    }
}

/// Persisted configuration stored in `~/.turret/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detector: DetectorConfig,
    pub controller: ControllerConfig,
    pub link: LinkConfig,
    pub camera: CameraConfig,
    pub source: SourceConfig,
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// The loop-facing subset of the configuration.
    pub fn loop_config(&self) -> TurretLoopConfig {
        TurretLoopConfig {
            detector: self.detector.clone(),
            controller: self.controller.clone(),
            camera: self.camera.clone(),
            max_consecutive_link_failures: self.link.max_consecutive_failures,
            max_ticks: self.source.max_ticks,
        }
    }
}

/// `TURRET_CONFIG`, or `~/.turret/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("TURRET_CONFIG") {
        return PathBuf::from(path);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".turret").join("config.toml")
}

/// Load the config with environment overrides applied.  Returns `None` if
/// the file does not exist.
pub fn load() -> Result<Option<Config>, TurretError> {
    let Some(mut cfg) = load_from(&config_path())? else {
        return Ok(None);
    };
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Parse the file at `path` without environment overrides.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, TurretError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        TurretError::Config(format!("failed to read config at {}: {e}", path.display()))
    })?;
    let cfg = toml::from_str(&raw).map_err(|e| {
        TurretError::Config(format!("failed to parse {}: {e}", path.display()))
    })?;
    Ok(Some(cfg))
}

/// Apply `TURRET_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `TURRET_SERIAL_PORT` | `link.port` |
/// | `TURRET_FRAME_DIR` | `source.frame_dir` |
/// | `TURRET_SNAPSHOT_DIR` | `telemetry.snapshot_dir` |
/// | `TURRET_MIN_AREA` | `detector.min_area` |
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |name| std::env::var(name).ok());
}

pub(crate) fn apply_overrides(cfg: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("TURRET_SERIAL_PORT") {
        cfg.link.port = v;
    }
    if let Some(v) = var("TURRET_FRAME_DIR") {
        cfg.source.frame_dir = Some(PathBuf::from(v));
    }
    if let Some(v) = var("TURRET_SNAPSHOT_DIR") {
        cfg.telemetry.snapshot_dir = Some(PathBuf::from(v));
    }
    if let Some(v) = var("TURRET_MIN_AREA")
        && let Ok(area) = v.parse::<f64>()
        && area >= 0.0
    {
        cfg.detector.min_area = area;
    }
}

/// Save the config to [`config_path`].
pub fn save(cfg: &Config) -> Result<(), TurretError> {
    save_to(cfg, &config_path())
}

/// Save the config to `path`, creating its directory if necessary.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), TurretError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            TurretError::Config(format!("failed to create config directory: {e}"))
        })?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| TurretError::Config(format!("failed to serialise config: {e}")))?;
    // Owner-only (rw-------) on Unix; the file names a device node.
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| {
                TurretError::Config(format!("failed to write config at {}: {e}", path.display()))
            })?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(|e| {
        TurretError::Config(format!("failed to write config at {}: {e}", path.display()))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, Config::default());
        assert_eq!(loaded.link.port, "/dev/ttyACM0");
        assert_eq!(loaded.controller.aim_settle_ms, 1000);
        assert_eq!(loaded.detector.min_area, 3000.0);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[controller]\npause_ms = 500\n\n[link]\nport = \"/dev/ttyUSB1\"\n\n[detector.color]\nmin_saturation = 80\n",
        )
        .unwrap();

        let cfg = load_from(&path).unwrap().unwrap();
        assert_eq!(cfg.controller.pause_ms, 500);
        assert_eq!(cfg.controller.shoot_settle_ms, 2000);
        assert_eq!(cfg.link.port, "/dev/ttyUSB1");
        assert_eq!(cfg.link.settle_ms, 100);
        assert_eq!(cfg.detector.color.min_saturation, 80);
        assert_eq!(cfg.detector.color.min_value, 50);
        assert_eq!(cfg.camera.width, 1280);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[controller\npause_ms = ").unwrap();
        assert!(matches!(load_from(&path), Err(TurretError::Config(_))));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn config_path_points_to_turret_dir() {
        let p = config_path_for_home("/home/testuser");
        assert_eq!(p, PathBuf::from("/home/testuser/.turret/config.toml"));
    }

    #[cfg(unix)]
    #[test]
    fn config_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        save_to(&Config::default(), &path).expect("save");
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn overrides_replace_fields() {
        let env = vars(&[
            ("TURRET_SERIAL_PORT", "/dev/ttyUSB0"),
            ("TURRET_FRAME_DIR", "/data/run1"),
            ("TURRET_SNAPSHOT_DIR", "/tmp/snaps"),
            ("TURRET_MIN_AREA", "1500"),
        ]);
        let mut cfg = Config::default();
        apply_overrides(&mut cfg, |k| env.get(k).cloned());
        assert_eq!(cfg.link.port, "/dev/ttyUSB0");
        assert_eq!(cfg.source.frame_dir, Some(PathBuf::from("/data/run1")));
        assert_eq!(cfg.telemetry.snapshot_dir, Some(PathBuf::from("/tmp/snaps")));
        assert_eq!(cfg.detector.min_area, 1500.0);
    }

    #[test]
    fn invalid_min_area_is_ignored() {
        for bad in ["lots", "-5"] {
            let env = vars(&[("TURRET_MIN_AREA", bad)]);
            let mut cfg = Config::default();
            apply_overrides(&mut cfg, |k| env.get(k).cloned());
            assert_eq!(cfg.detector.min_area, 3000.0);
        }
    }

    #[test]
    fn loop_config_carries_link_limit_and_tick_cap() {
        let mut cfg = Config::default();
        cfg.link.max_consecutive_failures = 9;
        cfg.source.max_ticks = Some(100);
        let loop_cfg = cfg.loop_config();
        assert_eq!(loop_cfg.max_consecutive_link_failures, 9);
        assert_eq!(loop_cfg.max_ticks, Some(100));
        assert_eq!(loop_cfg.controller, ControllerConfig::default());
    }
}
