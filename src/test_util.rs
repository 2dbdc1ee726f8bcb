//! Recording subscriber shared by the unit tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  demand::Demand,
  subscriber::{Completion, Subscriber},
  subscription::SubscriptionRef,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event<Item, Err> {
  Value(Item),
  Completion(Completion<Err>),
}

type Events<Item, Err> = Arc<Mutex<Vec<Event<Item, Err>>>>;

/// Subscriber that requests `initial` on subscription and replies `reply` to
/// every value.
pub(crate) struct Recorder<Item, Err> {
  events: Events<Item, Err>,
  subscription: Arc<Mutex<Option<SubscriptionRef>>>,
  initial: Demand,
  reply: Demand,
}

/// Test-side view of a [`Recorder`].
#[derive(Clone)]
pub(crate) struct Probe<Item, Err> {
  events: Events<Item, Err>,
  subscription: Arc<Mutex<Option<SubscriptionRef>>>,
}

pub(crate) fn recorder<Item, Err>(
  initial: Demand, reply: Demand,
) -> (Recorder<Item, Err>, Probe<Item, Err>) {
  let events = Arc::new(Mutex::new(Vec::new()));
  let subscription = Arc::new(Mutex::new(None));
  let recorder = Recorder {
    events: events.clone(),
    subscription: subscription.clone(),
    initial,
    reply,
  };
  (recorder, Probe { events, subscription })
}

impl<Item, Err> Subscriber<Item, Err> for Recorder<Item, Err> {
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    *self.subscription.lock() = Some(subscription.clone());
    subscription.request(self.initial);
  }

  fn receive(&mut self, value: Item) -> Demand {
    self.events.lock().push(Event::Value(value));
    self.reply
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.events.lock().push(Event::Completion(completion));
  }
}

impl<Item: Clone, Err: Clone> Probe<Item, Err> {
  pub(crate) fn events(&self) -> Vec<Event<Item, Err>> { self.events.lock().clone() }

  pub(crate) fn values(&self) -> Vec<Item> {
    self
      .events
      .lock()
      .iter()
      .filter_map(|event| match event {
        Event::Value(v) => Some(v.clone()),
        Event::Completion(_) => None,
      })
      .collect()
  }

  pub(crate) fn completion(&self) -> Option<Completion<Err>> {
    self.events.lock().iter().find_map(|event| match event {
      Event::Completion(c) => Some(c.clone()),
      Event::Value(_) => None,
    })
  }

  pub(crate) fn completions(&self) -> usize {
    self
      .events
      .lock()
      .iter()
      .filter(|event| matches!(event, Event::Completion(_)))
      .count()
  }

  pub(crate) fn is_subscribed(&self) -> bool { self.subscription.lock().is_some() }
}

impl<Item, Err> Probe<Item, Err> {
  pub(crate) fn request(&self, demand: Demand) {
    let subscription = self.subscription.lock().clone();
    if let Some(subscription) = subscription {
      subscription.request(demand);
    }
  }

  pub(crate) fn cancel(&self) {
    let subscription = self.subscription.lock().clone();
    if let Some(subscription) = subscription {
      subscription.cancel();
    }
  }
}
