//! Single-slot outgoing message buffer shared by the tick and main contexts.
//!
//! Staging over a message that has not been transmitted yet replaces it.
//! With [`OverrunPolicy::Count`] each replacement is counted and logged.

use crate::config::OverrunPolicy;
use crate::message::OutgoingMessage;

#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    slot: Option<OutgoingMessage>,
    policy: OverrunPolicy,
    overruns: u32,
}

impl Mailbox {
    pub fn new(policy: OverrunPolicy) -> Self {
        Self {
            slot: None,
            policy,
            overruns: 0,
        }
    }

    /// Stage `msg`, returning the message it replaced, if any.
    pub fn stage(&mut self, msg: OutgoingMessage) -> Option<OutgoingMessage> {
        let lost = self.slot.replace(msg);
        if let Some(lost) = lost
            && self.policy == OverrunPolicy::Count
        {
            self.overruns = self.overruns.saturating_add(1);
            tracing::warn!(?lost, overruns = self.overruns, "outgoing message overwritten");
        }
        lost
    }

    pub fn take(&mut self) -> Option<OutgoingMessage> {
        self.slot.take()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    /// Overwrites seen so far; always zero under `Silent`.
    pub fn overruns(&self) -> u32 {
        self.overruns
    }
}
