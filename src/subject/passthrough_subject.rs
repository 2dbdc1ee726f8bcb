use std::sync::Arc;

use super::subject_core::SubjectCore;
use crate::{
  demand::Demand,
  error::Result,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::SubscriptionRef,
};

/// A subject that multicasts values to the subscribers attached at the time
/// of each send, retaining nothing.
///
/// Subscribers without outstanding demand miss the value; nothing is queued
/// for them. Handles are cheap to clone and all refer to the same subject.
///
/// # Examples
///
/// ```
/// use std::{convert::Infallible, sync::Arc};
///
/// use parking_lot::Mutex;
/// use rxflow::prelude::*;
///
/// let subject = PassthroughSubject::<&str, Infallible>::new();
/// subject.send("lost");
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let out = seen.clone();
/// let _handle = subject.clone().sink_value(move |v| out.lock().push(v));
/// subject.send("Hello");
/// assert_eq!(*seen.lock(), vec!["Hello"]);
/// ```
pub struct PassthroughSubject<Item, Err> {
  core: Arc<SubjectCore<Item, Err, ()>>,
}

impl<Item, Err> Clone for PassthroughSubject<Item, Err> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

impl<Item, Err> PassthroughSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  pub fn new() -> Self { Self { core: SubjectCore::new(()) } }

  /// Delivers `value` to every attached subscriber with demand. Ignored once
  /// the subject has completed.
  pub fn send(&self, value: Item) { let _ = self.core.try_send(value); }

  /// Delivers `completion` to every attached subscriber and closes the
  /// subject. Only the first completion counts.
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

impl<Item, Err> Default for PassthroughSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn default() -> Self { Self::new() }
}

impl<Item, Err> Publisher for PassthroughSubject<Item, Err>
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

/// Re-broadcasts another publisher, requesting unlimited demand from it.
impl<Item, Err> Subscriber<Item, Err> for PassthroughSubject<Item, Err>
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

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    error::SubjectError,
    publisher::from_iter,
    test_util::{recorder, Event},
  };
  use std::convert::Infallible;

  #[test]
  fn drops_values_sent_before_attach_or_without_demand() {
    let subject = PassthroughSubject::<i32, Infallible>::new();
    subject.send(0);

    let (subscriber, probe) = recorder(Demand::max(1), Demand::none());
    subject.clone().subscribe(subscriber);
    subject.send(1);
    subject.send(2);
    probe.request(Demand::max(1));
    subject.send(3);
    assert_eq!(probe.values(), vec![1, 3]);
  }

  #[test]
  fn completion_closes_the_subject() {
    let subject = PassthroughSubject::<&str, &str>::new();
    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    subject.clone().subscribe(subscriber);
    subject.send("a");
    subject.send_completion(Completion::Failed("bad"));
    subject.send("b");
    subject.send_completion(Completion::Finished);

    assert_eq!(
      probe.events(),
      vec![Event::Value("a"), Event::Completion(Completion::Failed("bad"))]
    );
    assert_eq!(subject.try_send("c"), Err(SubjectError::Completed));
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[test]
  fn late_subscriber_gets_stored_completion() {
    let subject = PassthroughSubject::<i32, Infallible>::new();
    subject.send_completion(Completion::Finished);
    let (subscriber, probe) = recorder(Demand::none(), Demand::none());
    subject.subscribe(subscriber);
    assert!(probe.is_subscribed());
    assert_eq!(probe.events(), vec![Event::Completion(Completion::Finished)]);
  }

  #[test]
  fn cancel_detaches() {
    let subject = PassthroughSubject::<i32, Infallible>::new();
    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    subject.clone().subscribe(subscriber);
    assert_eq!(subject.subscriber_count(), 1);
    probe.cancel();
    assert_eq!(subject.subscriber_count(), 0);
    subject.send(1);
    assert!(probe.values().is_empty());
  }

  #[test]
  fn send_from_inside_a_callback_is_queued() {
    struct Echo {
      subject: PassthroughSubject<i32, Infallible>,
      seen: Arc<parking_lot::Mutex<Vec<i32>>>,
    }

    impl Subscriber<i32, Infallible> for Echo {
      fn receive_subscription(&mut self, subscription: SubscriptionRef) {
        subscription.request(Demand::unlimited());
      }

      fn receive(&mut self, value: i32) -> Demand {
        self.seen.lock().push(value);
        if value < 3 {
          self.subject.send(value + 1);
        }
        Demand::none()
      }

      fn receive_completion(&mut self, _completion: Completion<Infallible>) {}
    }

    let subject = PassthroughSubject::new();
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    subject.clone().subscribe(Echo { subject: subject.clone(), seen: seen.clone() });
    subject.send(1);
    assert_eq!(*seen.lock(), vec![1, 2, 3]);
  }

  #[test]
  fn rebroadcasts_an_upstream() {
    let subject = PassthroughSubject::<i32, Infallible>::new();
    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    subject.clone().subscribe(subscriber);
    from_iter(1..=3).subscribe(subject.clone());
    assert_eq!(probe.values(), vec![1, 2, 3]);
    assert_eq!(probe.completion(), Some(Completion::Finished));
    assert!(subject.is_completed());
  }
}
