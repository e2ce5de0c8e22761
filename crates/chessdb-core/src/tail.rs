//! Channel tailing, sync-marker tagging and multiplexing.
//!
//! A *channel tailer* replays every stored record of one kind, emits a single
//! sync marker, then (optionally) keeps emitting new records as they are
//! appended. This module turns N such tails into one consumption sequence:
//!
//! ```text
//! ┌──────────┐  tag()   ┌──────────────┐
//! │ tail(A)  │─────────▶│ Tagged<A, E> │──┐
//! └──────────┘          └──────────────┘  │  multiplex()   ┌──────────────┐
//! ┌──────────┐  tag()   ┌──────────────┐  ├───────────────▶│  one stream  │
//! │ tail(B)  │─────────▶│ Tagged<B, E> │──┘                └──────────────┘
//! └──────────┘          └──────────────┘
//! ```
//!
//! Per-input order is preserved. Nothing is promised about the interleaving
//! across inputs.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{BoxStream, SelectAll};
use futures::{Stream, StreamExt};

/// One element produced by a channel tailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailItem<E> {
    /// A stored or freshly appended record.
    Record(E),
    /// The backlog of this channel has been fully replayed.
    Sync,
}

/// An element of a multiplexed sequence: either a record or a sync marker
/// annotated with the channel it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tagged<C, E> {
    /// A domain record. Records are self-describing and carry no tag.
    Record(E),
    /// Backlog replay of channel `C` is complete.
    Sync(C),
}

/// A boxed channel tail, as handed over by the log collaborator.
pub type TailStream<E, Err> = BoxStream<'static, Result<TailItem<E>, Err>>;

/// A boxed multiplexed stream of tagged elements.
pub type TaggedStream<C, E, Err> = BoxStream<'static, Result<Tagged<C, E>, Err>>;

/// Annotates every sync marker of `tail` with `channel`.
pub fn tag<C, E, Err, S>(channel: C, tail: S) -> TaggedStream<C, E, Err>
where
    C: Copy + Send + 'static,
    E: Send + 'static,
    Err: Send + 'static,
    S: Stream<Item = Result<TailItem<E>, Err>> + Send + 'static,
{
    tail.map(move |item| {
        item.map(|item| match item {
            TailItem::Record(event) => Tagged::Record(event),
            TailItem::Sync => Tagged::Sync(channel),
        })
    })
    .boxed()
}

/// Merges several tagged streams into one.
///
/// Inputs are polled round-robin by [`SelectAll`], so an input with pending
/// data is never starved. The merged stream ends only when every input has
/// ended; live tails never do.
pub fn multiplex<C, E, Err>(
    inputs: impl IntoIterator<Item = TaggedStream<C, E, Err>>,
) -> SelectAll<TaggedStream<C, E, Err>> {
    futures::stream::select_all(inputs)
}

/// Tags each `(channel, tail)` pair and multiplexes the results.
pub fn tag_and_multiplex<C, E, Err>(
    tails: impl IntoIterator<Item = (C, TailStream<E, Err>)>,
) -> TaggedStream<C, E, Err>
where
    C: Copy + Send + 'static,
    E: Send + 'static,
    Err: Send + 'static,
{
    multiplex(tails.into_iter().map(|(channel, tail)| tag(channel, tail))).boxed()
}

/// Stream adapter that ends right after yielding the first `Err`.
///
/// Created by [`StopOnErrorExt::stop_on_error`].
#[derive(Debug)]
#[must_use = "streams do nothing unless polled"]
pub struct StopOnError<S> {
    inner: S,
    failed: bool,
}

impl<S, T, Err> Stream for StopOnError<S>
where
    S: Stream<Item = Result<T, Err>> + Unpin,
{
    type Item = Result<T, Err>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.failed {
            return Poll::Ready(None);
        }
        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Err(e))) => {
                this.failed = true;
                Poll::Ready(Some(Err(e)))
            }
            other => other,
        }
    }
}

/// Extension trait adding [`stop_on_error`](StopOnErrorExt::stop_on_error).
pub trait StopOnErrorExt: Sized {
    /// Ends the stream after the first error it yields.
    fn stop_on_error(self) -> StopOnError<Self>;
}

impl<S, T, Err> StopOnErrorExt for S
where
    S: Stream<Item = Result<T, Err>> + Unpin,
{
    fn stop_on_error(self) -> StopOnError<Self> {
        StopOnError {
            inner: self,
            failed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Chan {
        A,
        B,
    }

    fn finite_tail(records: Vec<u32>) -> TailStream<u32, String> {
        let mut items: Vec<Result<TailItem<u32>, String>> =
            records.into_iter().map(|r| Ok(TailItem::Record(r))).collect();
        items.push(Ok(TailItem::Sync));
        stream::iter(items).boxed()
    }

    #[tokio::test]
    async fn test_tag_annotates_sync_only() {
        let tagged: Vec<_> = tag(Chan::A, finite_tail(vec![1, 2])).collect().await;
        assert_eq!(
            tagged,
            vec![
                Ok(Tagged::Record(1)),
                Ok(Tagged::Record(2)),
                Ok(Tagged::Sync(Chan::A)),
            ]
        );
    }

    #[tokio::test]
    async fn test_multiplex_preserves_per_input_order() {
        let merged: Vec<_> = tag_and_multiplex(vec![
            (Chan::A, finite_tail(vec![1, 2, 3])),
            (Chan::B, finite_tail(vec![10, 20])),
        ])
        .collect()
        .await;

        assert_eq!(merged.len(), 7);

        let a: Vec<u32> = merged
            .iter()
            .filter_map(|i| match i {
                Ok(Tagged::Record(r)) if *r < 10 => Some(*r),
                _ => None,
            })
            .collect();
        let b: Vec<u32> = merged
            .iter()
            .filter_map(|i| match i {
                Ok(Tagged::Record(r)) if *r >= 10 => Some(*r),
                _ => None,
            })
            .collect();
        assert_eq!(a, vec![1, 2, 3]);
        assert_eq!(b, vec![10, 20]);

        let pos_sync_a = merged
            .iter()
            .position(|i| *i == Ok(Tagged::Sync(Chan::A)))
            .unwrap();
        let pos_last_a = merged.iter().position(|i| *i == Ok(Tagged::Record(3))).unwrap();
        assert!(pos_last_a < pos_sync_a);
    }

    #[tokio::test]
    async fn test_multiplex_reads_ready_input_while_other_is_pending() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Result<TailItem<u32>, String>>();
        let live = tokio_stream::wrappers::UnboundedReceiverStream::new(rx).boxed();

        let mut merged = tag_and_multiplex(vec![(Chan::A, live), (Chan::B, finite_tail(vec![7]))]);

        assert_eq!(merged.next().await, Some(Ok(Tagged::Record(7))));
        assert_eq!(merged.next().await, Some(Ok(Tagged::Sync(Chan::B))));

        tx.send(Ok(TailItem::Sync)).unwrap();
        assert_eq!(merged.next().await, Some(Ok(Tagged::Sync(Chan::A))));
    }

    #[tokio::test]
    async fn test_stop_on_error_ends_stream() {
        let items: Vec<Result<u32, &str>> = vec![Ok(1), Err("boom"), Ok(2)];
        let out: Vec<_> = stream::iter(items).stop_on_error().collect().await;
        assert_eq!(out, vec![Ok(1), Err("boom")]);
    }
}
