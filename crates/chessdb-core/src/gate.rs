//! Liveness gate.
//!
//! Tracks one "backlog replayed" flag per channel. The gate opens once every
//! tracked channel has delivered its sync marker and never closes again.

use std::fmt::Debug;

/// Outcome of feeding a sync marker to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTransition {
    /// This marker was the last one missing; the gate is now open.
    Opened,
    /// Other channels are still replaying their backlog.
    Waiting,
    /// The gate was already open (or the channel was already live).
    Unchanged,
    /// The marker belongs to a channel the gate does not track.
    Untracked,
}

/// Per-pipeline liveness flags.
#[derive(Debug, Clone)]
pub struct LivenessGate<C> {
    channels: Vec<(C, bool)>,
    pending: usize,
}

impl<C: Copy + PartialEq + Debug> LivenessGate<C> {
    /// Creates a gate tracking `channels`, all initially not live.
    ///
    /// Duplicate channels are tracked once. A gate with no channels is open
    /// from the start.
    #[must_use]
    pub fn new(channels: impl IntoIterator<Item = C>) -> Self {
        let mut tracked: Vec<(C, bool)> = Vec::new();
        for channel in channels {
            if !tracked.iter().any(|(c, _)| *c == channel) {
                tracked.push((channel, false));
            }
        }
        let pending = tracked.len();
        Self {
            channels: tracked,
            pending,
        }
    }

    /// Records the sync marker of `channel`.
    pub fn mark_live(&mut self, channel: C) -> GateTransition {
        let Some((_, live)) = self.channels.iter_mut().find(|(c, _)| *c == channel) else {
            tracing::debug!(?channel, "sync marker for untracked channel");
            return GateTransition::Untracked;
        };
        if *live {
            return GateTransition::Unchanged;
        }
        *live = true;
        self.pending -= 1;
        if self.pending == 0 {
            tracing::debug!(?channel, "all channels live, gate open");
            GateTransition::Opened
        } else {
            tracing::trace!(?channel, pending = self.pending, "channel live");
            GateTransition::Waiting
        }
    }

    /// Returns `true` once every tracked channel is live.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.pending == 0
    }

    /// Returns whether `channel` has replayed its backlog, or `None` if the
    /// channel is not tracked.
    #[must_use]
    pub fn is_live(&self, channel: C) -> Option<bool> {
        self.channels
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, live)| *live)
    }

    /// Number of channels still replaying.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
    }
}
