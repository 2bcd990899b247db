//! Command implementations: config loading, controller assembly, replay,
//! decode, live run and self-check.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axle_config::{Config, TraceTick};
use axle_core::frame::decode_stream;
use axle_core::runner::{RunOptions, replay, run};
use axle_core::util::ms_to_ticks;
use axle_core::{Controller, OutgoingMessage};
use axle_hardware::LoopbackSerial;
use axle_traits::{CellInput, ControlInput, SerialPort};
use axle_traits::clock::MonotonicClock;
use eyre::{Result, WrapErr};

use crate::report::{print_message, print_summary};

/// Load and validate the config file, or use defaults when none was given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        tracing::debug!("no config file given, using defaults");
        return Ok(Config::default());
    };
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = axle_config::load_toml(&text)
        .wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

fn build<P: SerialPort>(cfg: &Config, port: P) -> Result<Controller<P>> {
    Controller::builder()
        .with_port(port)
        .apply_config(cfg)
        .build()
}

// ── replay ───────────────────────────────────────────────────────────────────

pub fn replay_trace(cfg: &Config, trace: &Path, wire: Option<&Path>, json: bool) -> Result<()> {
    let rows = axle_config::load_trace_csv(trace)?;
    let port = LoopbackSerial::new();
    let mut controller = build(cfg, port.clone())?;
    tracing::info!(rows = rows.len(), trace = %trace.display(), "replaying trace");

    let summary = replay(&mut controller, &rows, |tick, msg| {
        print_message(json, Some(tick), msg);
    })?;
    if let Some(out) = wire {
        std::fs::write(out, port.sent())
            .wrap_err_with(|| format!("write wire capture {}", out.display()))?;
    }
    print_summary(json, &summary);
    Ok(())
}

// ── decode ───────────────────────────────────────────────────────────────────

/// Parse hex text: bytes separated by whitespace or commas, optionally
/// `0x`-prefixed, or runs of hex digit pairs.
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for token in text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        if digits.len() % 2 != 0 {
            eyre::bail!("odd number of hex digits in '{token}'");
        }
        for pair in digits.as_bytes().chunks(2) {
            let s = std::str::from_utf8(pair).wrap_err_with(|| format!("bad hex '{token}'"))?;
            let b = u8::from_str_radix(s, 16).wrap_err_with(|| format!("bad hex '{token}'"))?;
            out.push(b);
        }
    }
    Ok(out)
}

pub fn decode_capture(input: &Path, hex: bool, json: bool) -> Result<()> {
    let raw = std::fs::read(input).wrap_err_with(|| format!("read capture {}", input.display()))?;
    let bytes = if hex {
        let text = String::from_utf8(raw).wrap_err("hex capture is not UTF-8 text")?;
        parse_hex(&text)?
    } else {
        raw
    };

    let frames = decode_stream(&bytes);
    let mut bad = 0usize;
    for (i, frame) in frames.iter().enumerate() {
        match OutgoingMessage::decode(frame) {
            Ok(msg) => print_message(json, None, &msg),
            Err(e) => {
                bad += 1;
                tracing::warn!(frame = i, error = %e, "undecodable frame");
                if json {
                    println!(
                        "{}",
                        serde_json::json!({ "frame": i, "error": e.to_string(), "payload": frame.as_slice() })
                    );
                } else {
                    println!("frame {i}: {e} {:02X?}", frame.as_slice());
                }
            }
        }
    }
    if json {
        println!(
            "{}",
            serde_json::json!({ "decoded": { "bytes": bytes.len(), "frames": frames.len(), "undecodable": bad } })
        );
    } else {
        println!(
            "{} bytes, {} frames, {} undecodable",
            bytes.len(),
            frames.len(),
            bad
        );
    }
    Ok(())
}

// ── run ──────────────────────────────────────────────────────────────────────

fn install_ctrlc() -> Arc<AtomicBool> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler");
    }
    shutdown
}

fn drive<P, I, L>(
    cfg: &Config,
    port: P,
    cell: I,
    lines: L,
    ticks: Option<u64>,
    json: bool,
) -> Result<axle_core::RunSummary>
where
    P: SerialPort,
    I: CellInput + Send + 'static,
    L: ControlInput,
{
    let mut controller = build(cfg, port)?;
    let shutdown = install_ctrlc();
    let opts = RunOptions {
        max_ticks: ticks,
        poll_interval: Duration::from_micros(cfg.timing.poll_us),
    };
    run(
        &mut controller,
        cell,
        lines,
        MonotonicClock::new(),
        opts,
        &shutdown,
        |tick, msg| print_message(json, Some(tick), msg),
    )
}

pub fn run_live(cfg: &Config, ticks: Option<u64>, sim_axles: usize, json: bool) -> Result<()> {
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        let _ = sim_axles;
        let (cell, lines, port) = open_hardware(cfg)?;
        let summary = drive(cfg, port, cell, lines, ticks, json)?;
        print_summary(json, &summary);
        Ok(())
    }
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    {
        use axle_hardware::{ScriptedCell, SimulatedLines};
        use axle_traits::ControlLines;

        let t = sim_timing(cfg);
        let cell = ScriptedCell::passby(sim_axles.max(1), t.lead, t.on, t.gap).cycle();
        tracing::info!(axles = sim_axles, on_ticks = t.on, gap_ticks = t.gap, "simulated cell");
        let summary = drive(
            cfg,
            LoopbackSerial::new(),
            cell,
            SimulatedLines::new(ControlLines::ARMED),
            ticks,
            json,
        )?;
        print_summary(json, &summary);
        Ok(())
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_hardware(
    cfg: &Config,
) -> Result<(
    axle_hardware::GpioCell,
    axle_hardware::GpioLines,
    axle_hardware::UartSerial,
)> {
    let cell = axle_hardware::GpioCell::new(cfg.pins.cell_in, cfg.pins.cell_active_low)
        .wrap_err("open cell input")?;
    let lines = axle_hardware::GpioLines::new(cfg.pins.arm_in, cfg.pins.wake_in)
        .wrap_err("open control lines")?;
    let port = axle_hardware::UartSerial::open(
        cfg.serial.device.as_deref(),
        cfg.serial.baud,
        Duration::from_millis(cfg.serial.write_timeout_ms),
    )
    .wrap_err("open serial port")?;
    Ok((cell, lines, port))
}

// ── self-check ───────────────────────────────────────────────────────────────

/// Tick counts for a synthetic pass-by that any valid config detects.
struct SimTiming {
    lead: usize,
    on: usize,
    gap: usize,
}

fn sim_timing(cfg: &Config) -> SimTiming {
    let hz = cfg.timing.tick_hz;
    let window = usize::from(cfg.thresholds.window_length);
    let delays = u64::from(cfg.debounce.on_delay_ms) + u64::from(cfg.debounce.off_delay_ms);
    let ticks = |ms: u64| usize::try_from(ms_to_ticks(ms, hz)).unwrap_or(usize::MAX);
    SimTiming {
        lead: ticks(10).max(window),
        on: ticks(delays + 20).max(2 * window),
        gap: ticks(delays + 30).max(2 * window),
    }
}

fn synthetic_trace(cfg: &Config, axles: usize) -> Vec<TraceTick> {
    let t = sim_timing(cfg);
    let tick = |blocked, arm| TraceTick { blocked, arm };
    let mut rows = vec![tick(false, true); t.lead];
    for i in 0..axles {
        if i > 0 {
            rows.extend(std::iter::repeat_n(tick(false, true), t.gap));
        }
        rows.extend(std::iter::repeat_n(tick(true, true), t.on));
    }
    rows.extend(std::iter::repeat_n(tick(false, true), t.gap));
    // Dropping arm closes the pass-by
    rows.extend(std::iter::repeat_n(tick(false, false), 4));
    rows
}

pub fn self_check(cfg: &Config, json: bool) -> Result<()> {
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        let (mut cell, mut lines, _port) = open_hardware(cfg)?;
        let blocked = cell
            .is_blocked()
            .map_err(|e| axle_core::hw_error::map_hw_error(&*e))
            .wrap_err("read cell input")?;
        let l = lines
            .lines()
            .map_err(|e| axle_core::hw_error::map_hw_error(&*e))
            .wrap_err("read control lines")?;
        tracing::info!(blocked, arm = l.arm, wake = l.wake, "hardware inputs readable");
    }

    let port = LoopbackSerial::new();
    let mut controller = build(cfg, port.clone())?;
    let mut seen = Vec::new();
    replay(&mut controller, &synthetic_trace(cfg, 2), |_, msg| seen.push(*msg))?;

    let wire: Vec<OutgoingMessage> = decode_stream(&port.sent())
        .iter()
        .filter_map(|f| OutgoingMessage::decode(f).ok())
        .collect();
    if wire != seen {
        eyre::bail!("self-check failed: wire stream does not match sent messages");
    }
    let passby_ok = matches!(
        seen.as_slice(),
        [
            OutgoingMessage::PassbyStart { passby: 1, .. },
            OutgoingMessage::PassbyAxle { axle: 2, .. },
            OutgoingMessage::PassbyStop { axles: 2, .. },
        ]
    );
    let axle_ok = seen.len() == 2
        && seen
            .iter()
            .all(|m| matches!(m, OutgoingMessage::Axle { .. }));
    if !(passby_ok || axle_ok) {
        eyre::bail!("self-check failed: synthetic pass-by produced {seen:?}");
    }

    if json {
        println!(
            "{}",
            serde_json::json!({ "self_check": "ok", "messages": seen.len(), "tick_hz": cfg.timing.tick_hz })
        );
    } else {
        println!("self-check ok ({} messages)", seen.len());
    }
    Ok(())
}
