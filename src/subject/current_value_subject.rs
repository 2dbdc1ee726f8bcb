use std::sync::Arc;

use super::subject_core::{Latest, SubjectCore};
use crate::{
  demand::Demand,
  error::Result,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::SubscriptionRef,
};

/// A subject that holds a current value.
///
/// Every accepted [`send`](Self::send) replaces the value before it is
/// delivered. A new subscriber receives the value current at the time of its
/// first positive demand, ahead of any live value.
///
/// # Examples
///
/// ```
/// use std::convert::Infallible;
///
/// use rxflow::prelude::*;
///
/// let subject = CurrentValueSubject::<i32, Infallible>::new(0);
/// subject.send(1);
/// subject.send(2);
/// assert_eq!(subject.value(), 2);
/// ```
pub struct CurrentValueSubject<Item, Err> {
  core: Arc<SubjectCore<Item, Err, Latest<Item>>>,
}

impl<Item, Err> Clone for CurrentValueSubject<Item, Err> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

impl<Item, Err> CurrentValueSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  pub fn new(value: Item) -> Self { Self { core: SubjectCore::new(Latest(value)) } }

  /// The current value.
  pub fn value(&self) -> Item { self.core.with_retained(|latest| latest.0.clone()) }

  /// Replaces the current value and delivers it to every attached subscriber
  /// with demand. Ignored once the subject has completed.
  pub fn send(&self, value: Item) { let _ = self.core.try_send(value); }

  pub fn send_completion(&self, completion: Completion<Err>) {
    let _ = self.core.try_send_completion(completion);
  }

  /// Like [`send`](Self::send), but reports a send after completion.
  pub fn try_send(&self, value: Item) -> Result<()> { self.core.try_send(value) }

  pub fn try_send_completion(&self, completion: Completion<Err>) -> Result<()> {
    self.core.try_send_completion(completion)
  }

  pub fn is_completed(&self) -> bool { self.core.is_completed() }

  pub fn subscriber_count(&self) -> usize { self.core.subscriber_count() }
}

impl<Item, Err> Publisher for CurrentValueSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Item, Err> + Send + 'static,
  {
    self.core.attach(Box::new(subscriber))
  }
}

impl<Item, Err> Subscriber<Item, Err> for CurrentValueSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    subscription.request(Demand::unlimited());
  }

  fn receive(&mut self, value: Item) -> Demand {
    self.send(value);
    Demand::none()
  }

  fn receive_completion(&mut self, completion: Completion<Err>) { self.send_completion(completion); }
}
