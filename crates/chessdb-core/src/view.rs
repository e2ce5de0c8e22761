//! Live view pipelines.
//!
//! [`LiveView`] assembles the whole chain for one consumer:
//!
//! ```text
//! tails ──▶ tag ──▶ multiplex ──▶ gate ──▶ reducer ──▶ project ──▶ dedup ──▶ consumer
//! ```
//!
//! Every record is folded as soon as it is read, including records read
//! before the gate opens, so the accumulator is caught up the moment the last
//! channel finishes its backlog. Nothing is emitted before that moment. The
//! marker that opens the gate yields the first snapshot; afterwards every
//! folded record yields a candidate that goes through the change filter.
//!
//! Each `LiveView` owns its accumulator, gate and filter. Dropping the view
//! drops the upstream tails.

use std::fmt::Debug;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};

use crate::dedup::Dedup;
use crate::gate::{GateTransition, LivenessGate};
use crate::reducer::Reducer;
use crate::tail::{tag_and_multiplex, Tagged, TaggedStream, TailStream};

/// A lazily evaluated, potentially infinite stream of view snapshots.
///
/// Yields `Ok(snapshot)` after the gate opens and whenever the snapshot
/// changes. An upstream error is yielded once, the accumulator is dropped
/// and the stream ends.
#[must_use = "streams do nothing unless polled"]
pub struct LiveView<C, R: Reducer, F, Err> {
    inner: TaggedStream<C, R::Event, Err>,
    gate: LivenessGate<C>,
    reducer: R,
    state: R::State,
    filter: Dedup<R::Output, F>,
    events_folded: u64,
    terminated: bool,
}

impl<C, R, F, Err> LiveView<C, R, F, Err>
where
    C: Copy + PartialEq + Debug + Send + 'static,
    R: Reducer,
    R::Event: Send + 'static,
    R::Output: Clone,
    F: Fn(&R::Output, &R::Output) -> bool,
    Err: Send + 'static,
{
    /// Builds a view over `tails`, one per channel. The gate tracks exactly
    /// the channels given here.
    pub fn new(
        tails: impl IntoIterator<Item = (C, TailStream<R::Event, Err>)>,
        reducer: R,
        eq: F,
    ) -> Self {
        let tails: Vec<_> = tails.into_iter().collect();
        let gate = LivenessGate::new(tails.iter().map(|(channel, _)| *channel));
        Self::from_tagged(tag_and_multiplex(tails), gate, reducer, eq)
    }

    /// Builds a view over an already multiplexed stream.
    pub fn from_tagged(
        inner: TaggedStream<C, R::Event, Err>,
        gate: LivenessGate<C>,
        reducer: R,
        eq: F,
    ) -> Self {
        Self {
            inner,
            gate,
            reducer,
            state: R::State::default(),
            filter: Dedup::new(eq),
            events_folded: 0,
            terminated: false,
        }
    }

    /// Returns `true` once every channel has replayed its backlog.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.gate.is_open()
    }

    /// Returns `true` if the stream has ended.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Number of records folded so far.
    #[must_use]
    pub fn events_folded(&self) -> u64 {
        self.events_folded
    }

    fn candidate(&mut self) -> Option<R::Output> {
        let snapshot = self.reducer.project(&self.state);
        self.filter.admit(snapshot)
    }
}

// No field is structurally pinned.
impl<C, R: Reducer, F, Err> Unpin for LiveView<C, R, F, Err> {}

impl<C, R, F, Err> Stream for LiveView<C, R, F, Err>
where
    C: Copy + PartialEq + Debug + Send + 'static,
    R: Reducer,
    R::Event: Send + 'static,
    R::Output: Clone,
    F: Fn(&R::Output, &R::Output) -> bool,
    Err: Debug + Send + 'static,
{
    type Item = Result<R::Output, Err>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.terminated {
            return Poll::Ready(None);
        }

        loop {
            match this.inner.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(Tagged::Record(event)))) => {
                    this.reducer.apply(&mut this.state, &event);
                    this.events_folded += 1;
                    if this.gate.is_open() {
                        if let Some(snapshot) = this.candidate() {
                            return Poll::Ready(Some(Ok(snapshot)));
                        }
                    }
                }
                Poll::Ready(Some(Ok(Tagged::Sync(channel)))) => {
                    if this.gate.mark_live(channel) == GateTransition::Opened {
                        tracing::debug!(
                            events_folded = this.events_folded,
                            "view caught up with backlog"
                        );
                        if let Some(snapshot) = this.candidate() {
                            return Poll::Ready(Some(Ok(snapshot)));
                        }
                    }
                }
                Poll::Ready(Some(Err(error))) => {
                    tracing::warn!(?error, "upstream failure, terminating view");
                    this.terminated = true;
                    drop(std::mem::take(&mut this.state));
                    return Poll::Ready(Some(Err(error)));
                }
                Poll::Ready(None) => {
                    this.terminated = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
