//! Bounds for status polling loops.
//!
//! The protocol is a set of busy-wait loops on the Status register. By
//! default they spin until the device answers; a controller can instead be
//! given a maximum number of samples or a deadline check so that an absent
//! or hung device surfaces as [`AtaError::Timeout`].

use crate::error::{AtaError, Result};

/// How long a status polling loop may run.
#[derive(Debug, Clone, Copy, Default)]
pub enum PollPolicy {
    /// Poll until the device answers.
    #[default]
    Unbounded,
    /// Give up after this many status samples.
    Attempts(u32),
    /// Give up once the callback reports the deadline has passed.
    ///
    /// The callback is checked after every non-terminal sample, typically
    /// against a free-running hardware timer.
    Deadline(fn() -> bool),
}

/// Per-loop poll counter.
#[derive(Debug)]
pub(crate) struct Poller {
    policy: PollPolicy,
    polls: u32,
}

impl Poller {
    pub(crate) fn new(policy: PollPolicy) -> Self {
        Self { policy, polls: 0 }
    }

    /// Account for one non-terminal sample.
    pub(crate) fn tick(&mut self) -> Result<()> {
        self.polls = self.polls.saturating_add(1);

        let expired = match self.policy {
            PollPolicy::Unbounded => false,
            PollPolicy::Attempts(max) => self.polls >= max,
            PollPolicy::Deadline(expired) => expired(),
        };

        if expired {
            log::warn!("ata: giving up after {} status polls", self.polls);
            return Err(AtaError::Timeout { polls: self.polls });
        }

        core::hint::spin_loop();
        Ok(())
    }
}
