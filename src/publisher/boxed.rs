//! Type-erased publishers
//!
//! [`AnyPublisher`] hides a concrete pipeline type behind a boxed trait
//! object, so differently-built pipelines with the same item and failure
//! types can be stored, returned and swapped interchangeably. It needs a
//! cloneable pipeline; [`BoxPublisher`] erases any pipeline but can only be
//! subscribed once.

use crate::{
  publisher::Publisher,
  subscriber::{BoxedSubscriber, Subscriber},
};

// ============================================================================
// DynPublisher Trait
// ============================================================================

/// Object-safe, consuming subscribe. Implemented for every `Publisher + Send`.
pub trait DynSubscribe<Item, Err>: Send {
  fn dyn_subscribe(self: Box<Self>, subscriber: BoxedSubscriber<Item, Err>);
}

impl<P> DynSubscribe<P::Item, P::Err> for P
where
  P: Publisher + Send + 'static,
{
  fn dyn_subscribe(self: Box<Self>, subscriber: BoxedSubscriber<P::Item, P::Err>) {
    (*self).subscribe(subscriber)
  }
}

/// Object-safe publisher trait for type erasure.
///
/// Implemented for every `Publisher + Clone + Send`; the clone support is
/// what lets an [`AnyPublisher`] be subscribed more than once.
pub trait DynPublisher<Item, Err>: DynSubscribe<Item, Err> {
  /// Clone this publisher into a new boxed trait object.
  fn clone_box(&self) -> Box<dyn DynPublisher<Item, Err>>;
}

impl<P> DynPublisher<P::Item, P::Err> for P
where
  P: Publisher + Clone + Send + 'static,
{
  fn clone_box(&self) -> Box<dyn DynPublisher<P::Item, P::Err>> { Box::new(self.clone()) }
}

// ============================================================================
// AnyPublisher
// ============================================================================

/// A publisher with its concrete type erased.
pub struct AnyPublisher<Item, Err>(Box<dyn DynPublisher<Item, Err>>);

impl<Item, Err> AnyPublisher<Item, Err> {
  pub fn new<P>(publisher: P) -> Self
  where
    P: Publisher<Item = Item, Err = Err> + Clone + Send + 'static,
  {
    AnyPublisher(Box::new(publisher))
  }
}

impl<Item, Err> Clone for AnyPublisher<Item, Err> {
  fn clone(&self) -> Self { AnyPublisher(self.0.clone_box()) }
}

impl<Item, Err> Publisher for AnyPublisher<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Item, Err> + Send + 'static,
  {
    self.0.dyn_subscribe(Box::new(subscriber))
  }
}

// ============================================================================
// BoxPublisher
// ============================================================================

/// A single-shot publisher with its concrete type erased.
///
/// Unlike [`AnyPublisher`] the wrapped pipeline need not be `Clone`, so it
/// may capture state such as channels or owned resources.
pub struct BoxPublisher<Item, Err>(Box<dyn DynSubscribe<Item, Err>>);

impl<Item, Err> BoxPublisher<Item, Err> {
  pub fn new<P>(publisher: P) -> Self
  where
    P: Publisher<Item = Item, Err = Err> + Send + 'static,
  {
    BoxPublisher(Box::new(publisher))
  }
}

impl<Item, Err> Publisher for BoxPublisher<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Item, Err> + Send + 'static,
  {
    self.0.dyn_subscribe(Box::new(subscriber))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    demand::Demand,
    publisher::{from_iter, just, PublisherExt},
    subscriber::Completion,
    test_util::recorder,
  };
  use std::convert::Infallible;

  fn pick(flag: bool) -> AnyPublisher<i32, Infallible> {
    if flag {
      just(1).erase()
    } else {
      from_iter(vec![2, 3]).map(|v| v * 10).erase()
    }
  }

  #[test]
  fn erased_pipelines_are_interchangeable() {
    let (first, first_probe) = recorder(Demand::unlimited(), Demand::none());
    let (second, second_probe) = recorder(Demand::unlimited(), Demand::none());
    pick(true).subscribe(first);
    pick(false).subscribe(second);
    assert_eq!(first_probe.values(), vec![1]);
    assert_eq!(second_probe.values(), vec![20, 30]);
    assert_eq!(second_probe.completion(), Some(Completion::Finished));
  }

  #[test]
  fn clone_resubscribes() {
    let erased = from_iter(0..3).erase();
    let (first, first_probe) = recorder::<i32, Infallible>(Demand::max(1), Demand::none());
    let (second, second_probe) = recorder::<i32, Infallible>(Demand::unlimited(), Demand::none());
    erased.clone().subscribe(first);
    erased.subscribe(second);
    assert_eq!(first_probe.values(), vec![0]);
    assert_eq!(second_probe.values(), vec![0, 1, 2]);
  }

  // Owns a receiver, which cannot be cloned.
  struct Drain(std::sync::mpsc::Receiver<i32>);

  #[test]
  fn boxed_pipeline_need_not_be_clone() {
    let (tx, rx) = std::sync::mpsc::channel();
    tx.send(4).unwrap();
    tx.send(5).unwrap();
    drop(tx);
    let source = Drain(rx);
    let boxed: BoxPublisher<i32, Infallible> =
      just(()).flat_map(move |_| from_iter(source.0.try_iter().collect::<Vec<_>>())).boxed();

    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    boxed.subscribe(subscriber);
    assert_eq!(probe.values(), vec![4, 5]);
    assert_eq!(probe.completion(), Some(Completion::Finished));
  }
}
