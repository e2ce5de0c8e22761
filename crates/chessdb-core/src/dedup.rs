//! Change filter.
//!
//! Suppresses a candidate when it is equivalent to the value most recently
//! *emitted* (not the most recent candidate). The first candidate is always
//! emitted unless an explicit initial value says otherwise.
//!
//! Equivalence is caller-supplied. [`structural`] is full equality;
//! [`same_len`] only compares list lengths and will treat two different
//! lists of the same size as unchanged.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};

/// Full structural equality.
#[must_use]
pub fn structural<T: PartialEq>(candidate: &T, last: &T) -> bool {
    candidate == last
}

/// Cardinality-only equivalence for list snapshots.
#[must_use]
#[allow(clippy::ptr_arg)]
pub fn same_len<T>(candidate: &Vec<T>, last: &Vec<T>) -> bool {
    candidate.len() == last.len()
}

/// Stateful change filter.
#[derive(Debug, Clone)]
pub struct Dedup<T, F> {
    last: Option<T>,
    eq: F,
}

impl<T, F> Dedup<T, F>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    /// Creates a filter with no previous value.
    pub fn new(eq: F) -> Self {
        Self { last: None, eq }
    }

    /// Creates a filter that treats `initial` as already emitted.
    pub fn with_initial(initial: T, eq: F) -> Self {
        Self {
            last: Some(initial),
            eq,
        }
    }

    /// Returns `Some(candidate)` if it should be emitted, `None` if it is
    /// equivalent to the last emitted value.
    pub fn admit(&mut self, candidate: T) -> Option<T> {
        if let Some(last) = &self.last {
            if (self.eq)(&candidate, last) {
                return None;
            }
        }
        self.last = Some(candidate.clone());
        Some(candidate)
    }

    /// The most recently emitted value.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.last.as_ref()
    }
}

/// Stream adapter created by [`DedupExt::dedup_by`].
#[must_use = "streams do nothing unless polled"]
pub struct DedupStream<S: Stream, F> {
    inner: S,
    filter: Dedup<S::Item, F>,
}

impl<S, F> Stream for DedupStream<S, F>
where
    S: Stream + Unpin,
    S::Item: Clone + Unpin,
    F: Fn(&S::Item, &S::Item) -> bool + Unpin,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match this.inner.poll_next_unpin(cx) {
                Poll::Ready(Some(candidate)) => {
                    if let Some(item) = this.filter.admit(candidate) {
                        return Poll::Ready(Some(item));
                    }
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Adds change filtering to any `Unpin` stream.
pub trait DedupExt: Stream + Sized {
    /// Drops items equivalent (under `eq`) to the last emitted item.
    fn dedup_by<F>(self, eq: F) -> DedupStream<Self, F>
    where
        Self::Item: Clone,
        F: Fn(&Self::Item, &Self::Item) -> bool,
    {
        DedupStream {
            inner: self,
            filter: Dedup::new(eq),
        }
    }

    /// Drops consecutive equal items.
    fn dedup(self) -> DedupStream<Self, fn(&Self::Item, &Self::Item) -> bool>
    where
        Self::Item: Clone + PartialEq,
    {
        self.dedup_by(structural::<Self::Item> as fn(&Self::Item, &Self::Item) -> bool)
    }
}

impl<S: Stream> DedupExt for S {}
