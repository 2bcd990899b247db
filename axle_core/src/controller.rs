//! Tick context, main-loop controller and the boundary between them.
//!
//! [`Sensor`] is everything the tick handler mutates: the wheel front end,
//! the tick counter and the outgoing mailbox. It lives in a [`Shared`] cell.
//! [`Controller`] owns the session, thresholds and serial port and only sees
//! tick state through [`WheelSnapshot`] copies taken inside `Shared::with`.

use axle_traits::{ControlLines, SerialPort};
use eyre::WrapErr;

use crate::command::{
    CMD_GET_TICK_FREQ, CMD_RESET_COUNTERS, CommandReader, FramedCommand, Inbound, apply_byte,
};
use crate::config::{ReportMode, Thresholds};
use crate::critical::Shared;
use crate::error::{CoreError, Result};
use crate::frame::{MAX_FRAME, encode_frame};
use crate::hw_error::map_hw_error;
use crate::mailbox::Mailbox;
use crate::message::OutgoingMessage;
use crate::session::{Counters, SensorRequest, Session, SessionState};
use crate::status::{Leds, StatusIndicator};
use crate::util::ticks_to_ms;
use crate::wheel::{FrontEnd, WheelSnapshot};

/// State owned by the tick context.
#[derive(Debug)]
pub struct Sensor {
    front_end: FrontEnd,
    mailbox: Mailbox,
    report: ReportMode,
    tick_hz: u32,
    ticks: u64,
    enabled: bool,
}

impl Sensor {
    pub fn new(front_end: FrontEnd, mailbox: Mailbox, report: ReportMode, tick_hz: u32) -> Self {
        Self {
            front_end,
            mailbox,
            report,
            tick_hz,
            ticks: 0,
            enabled: false,
        }
    }

    /// Tick handler. The counter always advances; the wheel only runs while
    /// detection is armed.
    pub fn on_tick(&mut self, blocked: bool) {
        self.ticks = self.ticks.wrapping_add(1);
        if !self.enabled {
            return;
        }
        let now_ms = self.now_ms();
        if let Some(msg) = self.front_end.tick(blocked, now_ms) {
            match self.report {
                ReportMode::Axle => {
                    self.mailbox.stage(msg);
                }
                ReportMode::Passby => tracing::trace!(?msg, "wheel report not forwarded"),
            }
        }
    }

    pub fn now_ms(&self) -> u64 {
        ticks_to_ms(self.ticks, self.tick_hz)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn arm(&mut self, thresholds: Thresholds) -> std::result::Result<(), CoreError> {
        self.front_end.arm(thresholds, self.tick_hz)?;
        self.enabled = true;
        Ok(())
    }

    pub fn disarm(&mut self) {
        self.enabled = false;
    }

    pub fn snapshot(&self) -> WheelSnapshot {
        self.front_end.snapshot(self.now_ms())
    }

    pub fn clear_stop(&mut self) {
        self.front_end.clear_stop();
    }

    pub fn front_end(&self) -> &FrontEnd {
        &self.front_end
    }

    pub fn mailbox(&mut self) -> &mut Mailbox {
        &mut self.mailbox
    }
}

/// Cloneable handle the tick source drives.
#[derive(Debug, Clone)]
pub struct TickHandle {
    sensor: Shared<Sensor>,
}

impl TickHandle {
    pub fn on_tick(&self, blocked: bool) {
        self.sensor.with(|s| s.on_tick(blocked));
    }

    pub fn ticks(&self) -> u64 {
        self.sensor.with(|s| s.ticks())
    }
}

/// Main-loop side of the device.
pub struct Controller<P> {
    sensor: Shared<Sensor>,
    session: Session,
    thresholds: Thresholds,
    port: P,
    reader: CommandReader,
    tick_hz: u32,
    sent: u64,
    tx_buf: [u8; MAX_FRAME],
}

impl<P> core::fmt::Debug for Controller<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.session.state())
            .field("counters", &self.session.counters())
            .field("thresholds", &self.thresholds)
            .field("sent", &self.sent)
            .finish_non_exhaustive()
    }
}

impl<P: SerialPort> Controller<P> {
    pub(crate) fn from_parts(
        sensor: Sensor,
        session: Session,
        thresholds: Thresholds,
        port: P,
        tick_hz: u32,
    ) -> Self {
        Self {
            sensor: Shared::new(sensor),
            session,
            thresholds,
            port,
            reader: CommandReader::new(),
            tick_hz,
            sent: 0,
            tx_buf: [0; MAX_FRAME],
        }
    }

    pub fn tick_handle(&self) -> TickHandle {
        TickHandle {
            sensor: self.sensor.clone(),
        }
    }

    /// One main-loop iteration: service configuration traffic while idle,
    /// advance the session, and transmit the pending message.
    ///
    /// Returns every message put on the wire during this call, in order.
    pub fn poll(&mut self, lines: ControlLines) -> Result<Vec<OutgoingMessage>> {
        let mut sent = Vec::new();
        if self.session.state() == SessionState::Idle {
            self.service_commands(&mut sent)?;
        }

        let snapshot = self.sensor.with(|s| s.snapshot());
        let step = self.session.step(lines, &snapshot);
        if self.session.state() != SessionState::Idle && self.reader.is_pending() {
            tracing::debug!(state = ?self.session.state(), "dropping partial command frame");
            self.reader.reset();
        }
        match step.request {
            Some(SensorRequest::Arm) => {
                let thresholds = self.thresholds;
                self.sensor
                    .with(|s| s.arm(thresholds))
                    .wrap_err("arming sensor")?;
                tracing::info!(?thresholds, "detection armed");
            }
            Some(SensorRequest::Disarm) => {
                self.sensor.with(|s| s.disarm());
                tracing::info!("detection disarmed");
            }
            Some(SensorRequest::ClearStop) => self.sensor.with(|s| s.clear_stop()),
            None => {}
        }
        if let Some(msg) = step.message {
            self.sensor.with(|s| s.mailbox().stage(msg));
        }
        self.flush(&mut sent)?;
        Ok(sent)
    }

    fn service_commands(&mut self, sent: &mut Vec<OutgoingMessage>) -> Result<()> {
        while let Some(byte) = self
            .port
            .read_byte()
            .map_err(|e| map_hw_error(&*e))
            .wrap_err("serial read")?
        {
            for inbound in self.reader.push(byte) {
                let reply = match inbound {
                    Inbound::Byte(b) => {
                        let reply = apply_byte(b, &mut self.thresholds);
                        tracing::debug!(byte = b, ?reply, "config command");
                        reply
                    }
                    Inbound::Framed(frame) => match FramedCommand::parse(&frame) {
                        Some(cmd) => self.handle_framed(cmd),
                        None => {
                            tracing::warn!(payload = ?frame, "ignoring frame that is not a command");
                            continue;
                        }
                    },
                };
                self.sensor.with(|s| s.mailbox().stage(reply));
                self.flush(sent)?;
            }
        }
        Ok(())
    }

    fn handle_framed(&mut self, cmd: FramedCommand) -> OutgoingMessage {
        let FramedCommand { command, id } = cmd;
        tracing::debug!(command, id, "structured command");
        match command {
            CMD_RESET_COUNTERS => {
                self.session.reset_counters();
                OutgoingMessage::Response {
                    command,
                    id,
                    data: None,
                }
            }
            CMD_GET_TICK_FREQ => OutgoingMessage::Response {
                command,
                id,
                data: Some(u16::try_from(self.tick_hz).unwrap_or(u16::MAX)),
            },
            _ => OutgoingMessage::CommandRejected { command, id },
        }
    }

    fn flush(&mut self, sent: &mut Vec<OutgoingMessage>) -> Result<()> {
        if let Some(msg) = self.sensor.with(|s| s.mailbox().take()) {
            self.transmit(&msg)?;
            sent.push(msg);
        }
        Ok(())
    }

    fn transmit(&mut self, msg: &OutgoingMessage) -> Result<()> {
        let (payload, n) = msg.to_payload();
        let len = encode_frame(&payload[..n], &mut self.tx_buf)?;
        self.port
            .write_all(&self.tx_buf[..len])
            .map_err(|e| map_hw_error(&*e))
            .wrap_err_with(|| format!("transmitting {msg:?}"))?;
        self.sent = self.sent.wrapping_add(1);
        tracing::trace!(?msg, bytes = len, "message sent");
        Ok(())
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn counters(&self) -> Counters {
        self.session.counters()
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn tick_hz(&self) -> u32 {
        self.tick_hz
    }

    pub fn snapshot(&self) -> WheelSnapshot {
        self.sensor.with(|s| s.snapshot())
    }

    pub fn status(&self) -> StatusIndicator {
        self.session.state().into()
    }

    pub fn leds(&self, phase: bool) -> Leds {
        self.status().leds(phase, self.snapshot().indicators)
    }

    pub fn overruns(&self) -> u32 {
        self.sensor.with(|s| s.mailbox().overruns())
    }

    pub fn messages_sent(&self) -> u64 {
        self.sent
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}
