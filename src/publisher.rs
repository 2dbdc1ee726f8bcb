//! Publisher trait, the operator extension trait and the built-in sources
//!
//! A [`Publisher`] is a description of a stream. Nothing happens until
//! [`subscribe`](Publisher::subscribe) attaches a [`Subscriber`]; each
//! subscription is independent and driven by the demand its subscriber
//! requests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  demand::Demand,
  ops::{
    collect::Collect,
    flat_map::FlatMap,
    map::Map,
    prepend::Prepend,
    replace_empty::ReplaceEmpty,
    replace_nil::ReplaceNil,
    sink::{self, SinkFns},
    switch_to_latest::SwitchToLatest,
  },
  subject::CurrentValueSubject,
  subscriber::{Completion, Subscriber},
  subscription::AnyCancellable,
};

mod boxed;
mod from_iter;
mod just;
mod trivial;

pub use boxed::{AnyPublisher, BoxPublisher, DynPublisher, DynSubscribe};
pub use from_iter::{from_iter, FromIter};
pub use just::{just, Just};
pub use trivial::{empty, fail, Empty, Fail};

// ============================================================================
// Publisher Trait
// ============================================================================

/// The producing side of the protocol.
///
/// `subscribe` consumes the publisher. Publishers that can be subscribed more
/// than once implement `Clone`; every clone yields an independent
/// subscription.
pub trait Publisher {
  type Item: Send + 'static;
  type Err: Send + 'static;

  /// Attaches `subscriber`. It receives its subscription first, then values
  /// bounded by the demand it requests, then at most one completion.
  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Self::Item, Self::Err> + Send + 'static,
    Self: Sized;
}

// ============================================================================
// Operator Extension
// ============================================================================

/// Operators and attach helpers available on every [`Publisher`].
pub trait PublisherExt: Publisher + Sized {
  /// Transforms every value with `f`.
  ///
  /// ```
  /// use std::sync::Arc;
  ///
  /// use parking_lot::Mutex;
  /// use rxflow::prelude::*;
  ///
  /// let doubled = Arc::new(Mutex::new(Vec::new()));
  /// let out = doubled.clone();
  /// let _handle = publisher::from_iter(1..4)
  ///   .map(|v| v * 2)
  ///   .sink_value(move |v| out.lock().push(v));
  /// assert_eq!(*doubled.lock(), vec![2, 4, 6]);
  /// ```
  fn map<B, F>(self, f: F) -> Map<Self, F>
  where
    F: FnMut(Self::Item) -> B + Send + 'static,
    B: Send + 'static,
  {
    Map::new(self, f)
  }

  /// Groups values into vectors of `count`; a non-empty remainder is emitted
  /// when the upstream finishes.
  fn collect(self, count: usize) -> Collect<Self> { Collect::new(self, Some(count)) }

  /// Emits every value as one vector when the upstream finishes.
  fn collect_all(self) -> Collect<Self> { Collect::new(self, None) }

  /// Subscribes to the publisher `f` returns for each value and merges the
  /// inner values into one stream.
  fn flat_map<P, F>(self, f: F) -> FlatMap<Self, F>
  where
    F: FnMut(Self::Item) -> P + Send + 'static,
    P: Publisher<Err = Self::Err>,
  {
    FlatMap::new(self, Demand::unlimited(), f)
  }

  /// Like [`flat_map`](Self::flat_map), with at most `max_publishers` inner
  /// subscriptions alive at a time.
  fn flat_map_max<P, F>(self, max_publishers: Demand, f: F) -> FlatMap<Self, F>
  where
    F: FnMut(Self::Item) -> P + Send + 'static,
    P: Publisher<Err = Self::Err>,
  {
    FlatMap::new(self, max_publishers, f)
  }

  /// Substitutes `default` for every `None`.
  fn replace_nil<T>(self, default: T) -> ReplaceNil<Self, T>
  where
    Self: Publisher<Item = Option<T>>,
    T: Clone + Send + 'static,
  {
    ReplaceNil::new(self, default)
  }

  /// Emits `default` if the upstream finishes without a value.
  fn replace_empty(self, default: Self::Item) -> ReplaceEmpty<Self> {
    ReplaceEmpty::new(self, default)
  }

  /// Emits everything from `prefix` before the values of `self`.
  fn prepend<P>(self, prefix: P) -> Prepend<P, Self>
  where
    P: Publisher<Item = Self::Item, Err = Self::Err>,
  {
    Prepend::new(prefix, self)
  }

  /// Flattens a publisher of publishers, following only the latest one.
  fn switch_to_latest(self) -> SwitchToLatest<Self>
  where
    Self::Item: Publisher<Err = Self::Err>,
  {
    SwitchToLatest::new(self)
  }

  /// Hides the concrete pipeline behind an [`AnyPublisher`].
  fn erase(self) -> AnyPublisher<Self::Item, Self::Err>
  where
    Self: Clone + Send + 'static,
  {
    AnyPublisher::new(self)
  }

  /// Hides the concrete pipeline behind a single-shot [`BoxPublisher`]. Use
  /// this instead of [`erase`](Self::erase) when the pipeline is not `Clone`.
  fn boxed(self) -> BoxPublisher<Self::Item, Self::Err>
  where
    Self: Send + 'static,
  {
    BoxPublisher::new(self)
  }

  /// Attaches a subscriber requesting unlimited demand, calling `on_value`
  /// for every value and `on_completion` once at the end.
  fn sink<N, C>(self, on_value: N, on_completion: C) -> AnyCancellable
  where
    N: FnMut(Self::Item) + Send + 'static,
    C: FnOnce(Completion<Self::Err>) + Send + 'static,
  {
    sink::attach(self, SinkFns::new(on_value, on_completion))
  }

  /// [`sink`](Self::sink) for publishers that cannot fail.
  fn sink_value<N>(self, on_value: N) -> AnyCancellable
  where
    Self: Publisher<Err = std::convert::Infallible>,
    N: FnMut(Self::Item) + Send + 'static,
  {
    self.sink(on_value, |_| {})
  }

  /// Writes every value into `target`.
  fn assign(self, target: Arc<Mutex<Self::Item>>) -> AnyCancellable
  where
    Self: Publisher<Err = std::convert::Infallible>,
  {
    self.sink_value(move |value| *target.lock() = value)
  }

  /// Republishes every value through `subject`; the subject itself is not
  /// completed when the upstream finishes.
  fn assign_to<E>(self, subject: CurrentValueSubject<Self::Item, E>) -> AnyCancellable
  where
    Self: Publisher<Err = std::convert::Infallible>,
    Self::Item: Clone,
    E: Clone + Send + 'static,
  {
    self.sink_value(move |value| subject.send(value))
  }
}

impl<P: Publisher> PublisherExt for P {}

#[cfg(test)]
mod tests {
  use super::*;
  use std::convert::Infallible;

  #[test]
  fn sink_sees_values_then_completion() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let finished = Arc::new(Mutex::new(None));
    let (s, f) = (seen.clone(), finished.clone());
    let _handle = from_iter(vec!["a", "b"]).sink(
      move |v| s.lock().push(v),
      move |c: Completion<Infallible>| *f.lock() = Some(c.is_finished()),
    );
    assert_eq!(*seen.lock(), vec!["a", "b"]);
    assert_eq!(*finished.lock(), Some(true));
  }

  #[test]
  fn assign_keeps_latest() {
    let slot = Arc::new(Mutex::new(0));
    let _handle = from_iter(1..=5).assign(slot.clone());
    assert_eq!(*slot.lock(), 5);
  }

  #[test]
  fn assign_to_current_value_subject() {
    let subject = CurrentValueSubject::<i32, Infallible>::new(0);
    let _handle = just(9).assign_to(subject.clone());
    assert_eq!(subject.value(), 9);
    assert!(!subject.is_completed());
  }
}
