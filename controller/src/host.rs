use std::{
    io::ErrorKind,
    path::PathBuf,
    sync::{Arc, OnceLock},
    time::{Duration, Instant},
};

use anyhow::{bail, Context};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::Mutex,
};
use tracing::{info, warn};

use climate_common::{
    ActuatorError, BangBangBuilder, BangBangController, ClimateActions, ControllerConfig,
    OutputActuator, RuntimeConfig, TargetTemperatureConfig, ThresholdThermostat, Transition,
};

use crate::command::Command;

/// Actuator hooks for the host build: no relays attached, transitions are
/// only logged.
#[derive(Debug, Default)]
struct LogActions;

impl ClimateActions for LogActions {
    fn idle(&mut self) -> Result<(), ActuatorError> {
        info!("actuator: idle");
        Ok(())
    }

    fn cool(&mut self) -> Result<(), ActuatorError> {
        info!("actuator: cool");
        Ok(())
    }

    fn heat(&mut self) -> Result<(), ActuatorError> {
        info!("actuator: heat");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct LogOutput;

impl OutputActuator for LogOutput {
    fn set_output(&mut self, on: bool) -> Result<(), ActuatorError> {
        info!("actuator: output {}", if on { "ON" } else { "OFF" });
        Ok(())
    }
}

#[derive(Debug)]
enum Engine {
    BangBang(BangBangController<LogActions>),
    Threshold(ThresholdThermostat<LogOutput>),
}

impl Engine {
    fn build(config: &ControllerConfig, now_ms: u64) -> anyhow::Result<Self> {
        let engine = match config {
            ControllerConfig::BangBang(bang_bang) => Self::BangBang(
                BangBangBuilder::from_config(bang_bang)?
                    .build(LogActions)
                    .context("invalid bang-bang configuration")?,
            ),
            ControllerConfig::Threshold(threshold) => Self::Threshold(
                ThresholdThermostat::new(threshold, LogOutput, now_ms)
                    .context("invalid threshold configuration")?,
            ),
        };
        Ok(engine)
    }

    fn log_config(&self) {
        match self {
            Self::BangBang(controller) => controller.log_config(),
            Self::Threshold(thermostat) => thermostat.log_config(),
        }
    }

    fn on_temperature_update(
        &mut self,
        temp: f32,
        now_ms: u64,
    ) -> Result<Option<Transition>, ActuatorError> {
        match self {
            Self::BangBang(controller) => controller.on_temperature_update(temp),
            Self::Threshold(thermostat) => thermostat.on_temperature_update(temp, now_ms),
        }
    }

    fn status_json(&self, now_ms: u64) -> serde_json::Result<String> {
        match self {
            Self::BangBang(controller) => serde_json::to_string(&controller.status()),
            Self::Threshold(thermostat) => serde_json::to_string(&thermostat.status(now_ms)),
        }
    }

    fn apply(&mut self, command: Command, now_ms: u64) -> anyhow::Result<()> {
        match (self, command) {
            (Self::BangBang(controller), Command::Away(away)) => {
                controller.set_away(away);
                info!("away mode {}", if away { "on" } else { "off" });
            }
            (Self::BangBang(controller), Command::Target { low, high }) => {
                let target = match high {
                    Some(high) => TargetTemperatureConfig::range(low, high),
                    None => TargetTemperatureConfig::single(low),
                };
                if controller.set_target(target)? {
                    info!("target updated to {:.1}..{:.1}", target.low, target.high);
                }
            }
            (Self::Threshold(thermostat), Command::Target { low, high: None }) => {
                if thermostat.set_target(low) {
                    info!("target updated to {:.1}", thermostat.target());
                }
            }
            (Self::Threshold(thermostat), Command::Mode(mode)) => {
                if thermostat.set_mode(mode) {
                    info!("thermostat mode {}", mode.as_str());
                }
            }
            (engine, Command::Reading(temp)) => {
                log_transition(engine.on_temperature_update(temp, now_ms)?);
            }
            (engine, Command::Status) => {
                info!("status: {}", engine.status_json(now_ms)?);
            }
            (Self::BangBang(_), Command::Mode(_)) => {
                bail!("mode is only available on the threshold thermostat")
            }
            (Self::Threshold(_), Command::Away(_)) => {
                bail!("away mode is only available on the bang-bang controller")
            }
            (Self::Threshold(_), Command::Target { .. }) => {
                bail!("the threshold thermostat takes a single target")
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
struct ConfigStore {
    path: Arc<PathBuf>,
}

impl ConfigStore {
    fn new() -> Self {
        let path = std::env::var("CLIMATE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.climate/runtime.json"));
        Self::at(path)
    }

    fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    async fn load_runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        match tokio::fs::read_to_string(self.path.as_ref()).await {
            Ok(raw) => RuntimeConfig::from_json(&raw)
                .with_context(|| format!("invalid config at {}", self.path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    "no config at {}, using built-in defaults",
                    self.path.display()
                );
                Ok(RuntimeConfig::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = ConfigStore::new();
    let runtime = store.load_runtime_config().await.unwrap_or_else(|err| {
        warn!("failed to load runtime config: {err:#}");
        RuntimeConfig::default()
    });

    let engine = Engine::build(&runtime.controller, monotonic_ms())?;
    engine.log_config();
    let engine = Arc::new(Mutex::new(engine));

    spawn_sample_loop(engine.clone(), runtime.sample_interval_ms);
    spawn_command_loop(engine.clone());

    info!(
        "climate controller running, sampling every {}ms",
        runtime.sample_interval_ms
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");
    Ok(())
}

fn spawn_sample_loop(engine: Arc<Mutex<Engine>>, interval_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
        let mut tick: u64 = 0;

        loop {
            interval.tick().await;
            tick = tick.saturating_add(1);

            // Hardware integration point: replace with a real sensor driver.
            let temp = simulated_temperature(tick);
            let result = {
                let mut engine = engine.lock().await;
                engine.on_temperature_update(temp, monotonic_ms())
            };

            match result {
                Ok(transition) => log_transition(transition),
                Err(err) => warn!("actuator error at {temp:.1}: {err}"),
            }
        }
    });
}

fn spawn_command_loop(engine: Arc<Mutex<Engine>>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    warn!("stdin read error: {err}");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let outcome = match line.parse::<Command>() {
                Ok(command) => {
                    let mut engine = engine.lock().await;
                    engine.apply(command, monotonic_ms())
                }
                Err(err) => Err(err),
            };
            if let Err(err) = outcome {
                warn!("command '{}' failed: {err:#}", line.trim());
            }
        }
    });
}

fn log_transition(transition: Option<Transition>) {
    if let Some(Transition { from, to }) = transition {
        info!("mode {} -> {}", from.as_str(), to.as_str());
    }
}

/// Triangle wave sweeping 16.0..=28.0 over 40 samples.
fn simulated_temperature(tick: u64) -> f32 {
    let phase = (tick % 40) as f32;
    let offset = if phase < 20.0 { phase } else { 40.0 - phase };
    16.0 + offset * 0.6
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use climate_common::{ConfigError, ControllerMode, ThresholdConfig};
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("runtime.json"));

        let config = store.load_runtime_config().await.unwrap();
        assert_eq!(config.sample_interval_ms, 5_000);
        assert!(matches!(config.controller, ControllerConfig::BangBang(_)));
    }

    #[tokio::test]
    async fn loads_threshold_config_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("runtime.json");
        std::fs::write(
            &path,
            r#"{
                "controller": { "kind": "threshold", "target": 19.0, "min_cycle_ms": 30000 },
                "sample_interval_ms": 1000
            }"#,
        )
        .unwrap();

        let config = ConfigStore::at(&path).load_runtime_config().await.unwrap();
        assert_eq!(config.sample_interval_ms, 1_000);
        let ControllerConfig::Threshold(threshold) = config.controller else {
            panic!("expected threshold config");
        };
        assert_eq!(threshold.target, 19.0);
        assert_eq!(threshold.min_cycle_ms, 30_000);
    }

    #[tokio::test]
    async fn invalid_config_on_disk_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("runtime.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = ConfigStore::at(&path).load_runtime_config().await.unwrap_err();
        assert!(err.to_string().starts_with("invalid config at"));
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn simulated_sweep_covers_default_band() {
        let readings: Vec<f32> = (0..40).map(simulated_temperature).collect();

        let min = readings.iter().copied().fold(f32::INFINITY, f32::min);
        let max = readings.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(min, 16.0);
        assert_eq!(max, 28.0);
    }

    #[test]
    fn default_engine_routes_commands() {
        let mut engine = Engine::build(&ControllerConfig::default(), 0).unwrap();

        engine.apply(Command::Reading(30.0), 0).unwrap();
        engine.apply(Command::Away(true), 0).unwrap();
        engine.apply(Command::Reading(25.0), 0).unwrap();

        let Engine::BangBang(controller) = &engine else {
            panic!("default config should build a bang-bang controller");
        };
        assert!(controller.is_away());
        assert_eq!(controller.mode(), ControllerMode::Idle);

        assert!(engine.apply(Command::Mode(climate_common::ThermostatMode::Off), 0).is_err());
    }

    #[test]
    fn threshold_engine_rejects_band_target() {
        let config = ControllerConfig::Threshold(ThresholdConfig::default());
        let mut engine = Engine::build(&config, 0).unwrap();

        assert!(engine
            .apply(
                Command::Target {
                    low: 19.0,
                    high: Some(23.0)
                },
                0
            )
            .is_err());
        assert!(engine.apply(Command::Away(true), 0).is_err());
        engine
            .apply(
                Command::Target {
                    low: 22.0,
                    high: None,
                },
                0,
            )
            .unwrap();

        let Engine::Threshold(thermostat) = &engine else {
            panic!("expected threshold thermostat");
        };
        assert_eq!(thermostat.target(), 22.0);
    }
}
