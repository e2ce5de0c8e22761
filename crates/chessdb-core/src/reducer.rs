//! Fold functions over tagged events.
//!
//! A [`Reducer`] owns the rules, not the state. The accumulator is created by
//! the pipeline that drives the reducer and passed into every call, so two
//! pipelines never share one.
//!
//! # Totality
//!
//! [`Reducer::apply`] cannot fail. Events a reducer does not understand, or
//! that are missing the fields its rules need, must be ignored. A live view
//! that stalls on one bad record is worse than one that skips it.

use futures::{Stream, StreamExt};

use crate::tail::TailItem;

/// Derives accumulator state from a sequence of events.
pub trait Reducer {
    /// Event type consumed by the fold.
    type Event;

    /// Accumulator. A fresh pipeline starts from `State::default()`.
    type State: Default;

    /// Public shape handed to consumers.
    type Output;

    /// Folds one event into `state`.
    fn apply(&self, state: &mut Self::State, event: &Self::Event);

    /// Extracts the public snapshot from `state`.
    fn project(&self, state: &Self::State) -> Self::Output;
}

/// Folds a finite tail to its end and returns the projected result.
///
/// Sync markers are skipped. The first upstream error aborts the fold and the
/// partial state is dropped.
///
/// # Errors
///
/// Returns the first error yielded by `tail`.
pub async fn fold_to_end<R, S, Err>(reducer: &R, tail: S) -> Result<R::Output, Err>
where
    R: Reducer,
    S: Stream<Item = Result<TailItem<R::Event>, Err>>,
{
    let mut state = R::State::default();
    let mut tail = std::pin::pin!(tail);
    while let Some(item) = tail.next().await {
        match item? {
            TailItem::Record(event) => reducer.apply(&mut state, &event),
            TailItem::Sync => {}
        }
    }
    Ok(reducer.project(&state))
}
