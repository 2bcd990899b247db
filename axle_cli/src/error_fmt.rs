//! Human-readable error descriptions and structured JSON error formatting.

use axle_core::error::{BuildError, CoreError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingPort => {
                "What happened: No serial port was provided to the controller.\nLikely causes: The serial device failed to open or was not wired into the builder.\nHow to fix: Ensure the port is created successfully and passed via with_port(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/axle_config.toml for a sample."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<CoreError>() {
        return match ce {
            CoreError::Timeout => "What happened: The serial transmitter did not drain in time.\nLikely causes: Wrong serial device, flow control holding the line, or write timeout too low.\nHow to fix: Check [serial] in the config and raise serial.write_timeout_ms.".to_string(),
            CoreError::Serial(msg) => format!(
                "What happened: Serial port error ({msg}).\nLikely causes: Device busy, missing permissions, or wrong baud rate.\nHow to fix: Verify serial.device and serial.baud and that the user may open the port."
            ),
            CoreError::Hardware(msg) | CoreError::HardwareFault(msg) => format!(
                "What happened: Hardware error ({msg}).\nLikely causes: Wrong pin numbers, wiring, or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config and check the wiring."
            ),
            CoreError::Frame(msg) | CoreError::Decode(msg) => format!(
                "What happened: Could not decode serial data ({msg}).\nLikely causes: Capture is truncated, not framed, or hex given without --hex.\nHow to fix: Re-capture the stream or pass --hex for text dumps."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("trace csv must have headers") {
        return "Invalid headers in trace CSV. Expected 'cell,arm'.".to_string();
    }

    if lower.contains("open cell input")
        || lower.contains("open control lines")
        || lower.contains("open serial port")
    {
        return format!(
            "What happened: Failed to initialize hardware.\nLikely causes: Incorrect pin numbers, wrong serial device, or insufficient permissions.\nHow to fix: Fix the [pins] and [serial] values in the config. Original: {msg}"
        );
    }

    if lower.contains("invalid configuration") || lower.contains("parse config") {
        return format!(
            "What happened: Configuration is invalid or incomplete.\nLikely causes: Out-of-range values or unknown keys in the TOML.\nHow to fix: Edit the TOML config and try again. Original: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 is left to clap usage errors.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 3;
    }
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::Config(_)) => 3,
        Some(CoreError::Timeout | CoreError::Serial(_)) => 4,
        Some(CoreError::Hardware(_) | CoreError::HardwareFault(_)) => 5,
        Some(CoreError::Frame(_) | CoreError::Decode(_)) => 6,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingPort => "MissingPort",
            BuildError::InvalidConfig(_) => "InvalidConfig",
        };
    }
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::Hardware(_)) => "Hardware",
        Some(CoreError::HardwareFault(_)) => "HardwareFault",
        Some(CoreError::Serial(_)) => "Serial",
        Some(CoreError::Timeout) => "Timeout",
        Some(CoreError::Config(_)) => "Config",
        Some(CoreError::Frame(_)) => "Frame",
        Some(CoreError::Decode(_)) => "Decode",
        Some(CoreError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
