#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and tick-trace parsing for the axle counter.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section is optional; omitted values fall back to the reference
//!   device settings (2 kHz tick, window 4, thresholds 1/1, 2 s error).
//! - The trace CSV loader enforces headers and 0/1 levels.
use serde::Deserialize;

/// Largest moving-sum window the engine supports.
pub const MAX_WINDOW: u8 = 32;

/// Trace CSV schema, one row per tick.
///
/// Expected headers:
/// cell,arm
///
/// Example:
/// cell,arm
/// 0,1
/// 1,1
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TraceRow {
    pub cell: u8,
    pub arm: u8,
}

/// One validated tick of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceTick {
    pub blocked: bool,
    pub arm: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    pub cell_in: u8,
    /// Cell pulls its line low while blocked
    pub cell_active_low: bool,
    pub arm_in: u8,
    pub wake_in: Option<u8>,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            cell_in: 17,
            cell_active_low: true,
            arm_in: 27,
            wake_in: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Serial {
    /// Device path; the primary UART when absent
    pub device: Option<String>,
    pub baud: u32,
    /// Upper bound on waiting for the transmitter per message
    pub write_timeout_ms: u64,
}

impl Default for Serial {
    fn default() -> Self {
        Self {
            device: None,
            baud: 9600,
            write_timeout_ms: 50,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub tick_hz: u32,
    /// Main loop poll period in microseconds
    pub poll_us: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick_hz: 2000,
            poll_us: 500,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub window_length: u8,
    pub threshold_on: u8,
    pub threshold_off: u8,
    pub error_seconds: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            window_length: 4,
            threshold_on: 1,
            threshold_off: 1,
            error_seconds: 2,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Debounce {
    pub on_delay_ms: u32,
    pub off_delay_ms: u32,
    pub max_on_ms: u32,
    pub stop_ms: u32,
}

impl Default for Debounce {
    fn default() -> Self {
        Self {
            on_delay_ms: 3,
            off_delay_ms: 3,
            max_on_ms: 1000,
            stop_ms: 3000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FrontEnd {
    #[default]
    MovingSum,
    Debounce,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Report {
    Axle,
    #[default]
    Passby,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Overrun {
    #[default]
    Silent,
    Count,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Session {
    pub front_end: FrontEnd,
    pub report: Report,
    /// Off time after the last axle that ends a pass-by (moving-sum front end)
    pub stop_timeout_ms: u32,
    pub overrun: Overrun,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            front_end: FrontEnd::MovingSum,
            report: Report::Passby,
            stop_timeout_ms: 3000,
            overrun: Overrun::Silent,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub serial: Serial,
    pub timing: Timing,
    pub thresholds: Thresholds,
    pub debounce: Debounce,
    pub session: Session,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_trace_csv(path: &std::path::Path) -> eyre::Result<Vec<TraceTick>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open trace CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["cell", "arm"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "trace CSV must have headers 'cell,arm', got: {}",
            actual.join(",")
        );
    }

    let mut ticks = Vec::new();
    for (idx, rec) in rdr.deserialize::<TraceRow>().enumerate() {
        let row = match rec {
            Ok(row) => row,
            Err(e) => eyre::bail!("invalid CSV row {}: {}", idx + 2, e),
        };
        if row.cell > 1 || row.arm > 1 {
            eyre::bail!(
                "invalid CSV row {}: levels must be 0 or 1, got cell={} arm={}",
                idx + 2,
                row.cell,
                row.arm
            );
        }
        ticks.push(TraceTick {
            blocked: row.cell == 1,
            arm: row.arm == 1,
        });
    }
    if ticks.is_empty() {
        eyre::bail!("trace CSV {:?} has no rows", path);
    }
    Ok(ticks)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Timing
        if self.timing.tick_hz < 100 || self.timing.tick_hz > 50_000 {
            eyre::bail!("timing.tick_hz must be in [100, 50000]");
        }
        if self.timing.poll_us == 0 {
            eyre::bail!("timing.poll_us must be >= 1");
        }

        // Thresholds
        let t = &self.thresholds;
        if t.window_length == 0 || t.window_length > MAX_WINDOW {
            eyre::bail!("thresholds.window_length must be in [1, {MAX_WINDOW}]");
        }
        let half = t.window_length / 2;
        if t.threshold_on >= half {
            eyre::bail!(
                "thresholds.threshold_on must be < window_length/2 ({half}), got {}",
                t.threshold_on
            );
        }
        if t.threshold_off >= half {
            eyre::bail!(
                "thresholds.threshold_off must be < window_length/2 ({half}), got {}",
                t.threshold_off
            );
        }
        if t.error_seconds == 0 {
            eyre::bail!("thresholds.error_seconds must be >= 1");
        }

        // Debounce
        let d = &self.debounce;
        if d.on_delay_ms == 0 || d.on_delay_ms > 1000 {
            eyre::bail!("debounce.on_delay_ms must be in [1, 1000]");
        }
        if d.off_delay_ms == 0 || d.off_delay_ms > 1000 {
            eyre::bail!("debounce.off_delay_ms must be in [1, 1000]");
        }
        if d.max_on_ms == 0 {
            eyre::bail!("debounce.max_on_ms must be >= 1");
        }
        if d.stop_ms == 0 {
            eyre::bail!("debounce.stop_ms must be >= 1");
        }

        // Session
        if self.session.stop_timeout_ms == 0 {
            eyre::bail!("session.stop_timeout_ms must be >= 1");
        }
        if self.session.report == Report::Axle && self.session.front_end != FrontEnd::MovingSum {
            eyre::bail!("session.report = \"axle\" requires session.front_end = \"moving_sum\"");
        }

        // Serial
        if self.serial.baud == 0 {
            eyre::bail!("serial.baud must be > 0");
        }
        if self.serial.write_timeout_ms == 0 {
            eyre::bail!("serial.write_timeout_ms must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly; got {rot:?}");
        }

        Ok(())
    }
}
