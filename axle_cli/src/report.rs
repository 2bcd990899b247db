//! Human and JSON renderings of messages and run summaries.

use axle_core::OutgoingMessage;
use axle_core::RunSummary;
use serde_json::{Value, json};

/// Stable snake_case name of a message kind.
pub fn kind(msg: &OutgoingMessage) -> &'static str {
    match msg {
        OutgoingMessage::Axle { .. } => "axle",
        OutgoingMessage::AxleError { .. } => "axle_error",
        OutgoingMessage::SetupOk { .. } => "setup_ok",
        OutgoingMessage::SetupError { .. } => "setup_error",
        OutgoingMessage::Report { .. } => "report",
        OutgoingMessage::Echo { .. } => "echo",
        OutgoingMessage::PassbyStart { .. } => "passby_start",
        OutgoingMessage::PassbyAxle { .. } => "passby_axle",
        OutgoingMessage::PassbyStop { .. } => "passby_stop",
        OutgoingMessage::PassbyError { .. } => "passby_error",
        OutgoingMessage::Response { .. } => "response",
        OutgoingMessage::CommandRejected { .. } => "command_rejected",
    }
}

pub fn message_json(tick: Option<u64>, msg: &OutgoingMessage) -> Value {
    let mut v = match *msg {
        OutgoingMessage::Axle { on, off } => json!({ "on": on, "off": off }),
        OutgoingMessage::AxleError { off } => json!({ "off": off }),
        OutgoingMessage::SetupOk { command } | OutgoingMessage::SetupError { command } => {
            json!({ "command": command })
        }
        OutgoingMessage::Report { param, value } => {
            json!({ "param": param.name(), "value": value })
        }
        OutgoingMessage::Echo { byte } => json!({ "byte": byte }),
        OutgoingMessage::PassbyStart {
            passby,
            timestamp_ms,
        } => json!({ "passby": passby, "timestamp_ms": timestamp_ms }),
        OutgoingMessage::PassbyAxle {
            passby,
            axle,
            time_ms,
        } => json!({ "passby": passby, "axle": axle, "time_ms": time_ms }),
        OutgoingMessage::PassbyStop {
            passby,
            axles,
            stop_time_ms,
        } => json!({ "passby": passby, "axles": axles, "stop_time_ms": stop_time_ms }),
        OutgoingMessage::PassbyError { errors } => json!({ "errors": errors }),
        OutgoingMessage::Response { command, id, data } => {
            json!({ "command": command, "id": id, "data": data })
        }
        OutgoingMessage::CommandRejected { command, id } => json!({ "command": command, "id": id }),
    };
    v["kind"] = json!(kind(msg));
    if let Some(t) = tick {
        v["tick"] = json!(t);
    }
    v
}

pub fn describe(msg: &OutgoingMessage) -> String {
    match *msg {
        OutgoingMessage::Axle { on, off } => format!("AXLE on={on} off={off} (x4 ticks)"),
        OutgoingMessage::AxleError { off } => format!("AXLE ERROR off={off} (x4 ticks)"),
        OutgoingMessage::SetupOk { command } => format!("SETUP OK {command}"),
        OutgoingMessage::SetupError { command } => format!("SETUP ERROR {command}"),
        OutgoingMessage::Report { param, value } => format!("{} = {value}", param.name()),
        OutgoingMessage::Echo { byte } => format!("ECHO 0x{byte:02X}"),
        OutgoingMessage::PassbyStart {
            passby,
            timestamp_ms,
        } => format!("START passby={passby} at {timestamp_ms} ms"),
        OutgoingMessage::PassbyAxle {
            passby,
            axle,
            time_ms,
        } => format!("AXLE passby={passby} axle={axle} +{time_ms} ms"),
        OutgoingMessage::PassbyStop {
            passby,
            axles,
            stop_time_ms,
        } => format!("STOP passby={passby} axles={axles} +{stop_time_ms} ms"),
        OutgoingMessage::PassbyError { errors } => format!("SENSOR ERROR count={errors}"),
        OutgoingMessage::Response {
            command,
            id,
            data: Some(d),
        } => format!("RESPONSE command={command} id={id} data={d}"),
        OutgoingMessage::Response {
            command,
            id,
            data: None,
        } => format!("RESPONSE command={command} id={id}"),
        OutgoingMessage::CommandRejected { command, id } => {
            format!("REJECTED command={command} id={id}")
        }
    }
}

/// Print one message line in the selected format.
pub fn print_message(json: bool, tick: Option<u64>, msg: &OutgoingMessage) {
    if json {
        println!("{}", message_json(tick, msg));
    } else {
        match tick {
            Some(t) => println!("tick {t:>8}: {}", describe(msg)),
            None => println!("{}", describe(msg)),
        }
    }
}

pub fn summary_json(s: &RunSummary) -> Value {
    json!({
        "summary": {
            "ticks": s.ticks,
            "messages": s.messages,
            "passbys": s.counters.passbys,
            "errors": s.counters.errors,
            "overruns": s.overruns,
            "cell_faults": s.cell_faults,
            "final_state": s.final_state.as_str(),
        }
    })
}

pub fn print_summary(json: bool, s: &RunSummary) {
    if json {
        println!("{}", summary_json(s));
    } else {
        println!(
            "{} ticks, {} messages, {} pass-bys, {} sensor errors, {} overruns, final state {}",
            s.ticks,
            s.messages,
            s.counters.passbys,
            s.counters.errors,
            s.overruns,
            s.final_state.as_str()
        );
        if s.cell_faults > 0 {
            println!("{} cell read faults", s.cell_faults);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passby_stop_json_fields() {
        let v = message_json(
            Some(111),
            &OutgoingMessage::PassbyStop {
                passby: 1,
                axles: 2,
                stop_time_ms: 97,
            },
        );
        assert_eq!(v["kind"], "passby_stop");
        assert_eq!(v["axles"], 2);
        assert_eq!(v["stop_time_ms"], 97);
        assert_eq!(v["tick"], 111);
    }

    #[test]
    fn response_without_data_is_null() {
        let v = message_json(
            None,
            &OutgoingMessage::Response {
                command: 0,
                id: 3,
                data: None,
            },
        );
        assert!(v["data"].is_null());
        assert!(v.get("tick").is_none());
    }
}
