//! Subscriber trait and the terminal `Completion` event
//!
//! A Subscriber is the consuming end of the protocol. It receives exactly one
//! [`Subscription`](crate::subscription::Subscription), then values (each
//! reply is a [`Demand`] for more), then at most one [`Completion`].

use crate::{demand::Demand, subscription::SubscriptionRef};

// ============================================================================
// Completion
// ============================================================================

/// Terminal event of a stream: successful finish or a typed failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion<Err> {
  Finished,
  Failed(Err),
}

impl<Err> Completion<Err> {
  #[inline]
  pub fn is_finished(&self) -> bool { matches!(self, Completion::Finished) }

  #[inline]
  pub fn is_failed(&self) -> bool { matches!(self, Completion::Failed(_)) }

  /// Converts the failure, leaving `Finished` untouched.
  pub fn map_err<E2>(self, f: impl FnOnce(Err) -> E2) -> Completion<E2> {
    match self {
      Completion::Finished => Completion::Finished,
      Completion::Failed(e) => Completion::Failed(f(e)),
    }
  }

  pub fn err(self) -> Option<Err> {
    match self {
      Completion::Finished => None,
      Completion::Failed(e) => Some(e),
    }
  }
}

// ============================================================================
// Subscriber Trait
// ============================================================================

/// Subscriber trait: the consumer in the publish/subscribe protocol.
///
/// All methods take `&mut self` so the trait stays object-safe; a completed
/// subscriber is simply dropped by its publisher. Calls are never made
/// concurrently for the same subscriber, and a subscriber may call back into
/// its subscription (`request`, `cancel`) from any of these methods.
pub trait Subscriber<Item, Err> {
  /// Called once, before anything else. Store the handle to drive demand;
  /// nothing is delivered until demand is requested through it.
  fn receive_subscription(&mut self, subscription: SubscriptionRef);

  /// Called for every value, never more often than the demand granted so
  /// far. The returned demand is added to the outstanding demand.
  fn receive(&mut self, value: Item) -> Demand;

  /// Called at most once; nothing follows it.
  fn receive_completion(&mut self, completion: Completion<Err>);
}

/// Type-erased subscriber, as stored by publishers.
pub type BoxedSubscriber<Item, Err> = Box<dyn Subscriber<Item, Err> + Send>;

impl<Item, Err> Subscriber<Item, Err> for BoxedSubscriber<Item, Err> {
  #[inline]
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    (**self).receive_subscription(subscription)
  }

  #[inline]
  fn receive(&mut self, value: Item) -> Demand { (**self).receive(value) }

  #[inline]
  fn receive_completion(&mut self, completion: Completion<Err>) {
    (**self).receive_completion(completion)
  }
}
