//! Collect operator implementation
//!
//! Buffers upstream values into vectors. With a count, a vector is emitted
//! each time the buffer fills and a non-empty remainder on finish; without
//! one, the whole sequence (possibly empty) is emitted on finish. The
//! upstream is always asked for unlimited values.

use std::sync::Arc;

use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::{outlet::Outlet, upstream::Upstream, Subscription, SubscriptionRef},
};

/// Publisher returned by [`collect`](crate::publisher::PublisherExt::collect)
/// and [`collect_all`](crate::publisher::PublisherExt::collect_all).
#[derive(Clone)]
pub struct Collect<S> {
  source: S,
  count: Option<usize>,
}

impl<S> Collect<S> {
  // A count of zero behaves like a count of one.
  pub(crate) fn new(source: S, count: Option<usize>) -> Self {
    Collect { source, count: count.map(|n| n.max(1)) }
  }
}

impl<S: Publisher> Publisher for Collect<S> {
  type Item = Vec<S::Item>;
  type Err = S::Err;

  fn subscribe<O>(self, subscriber: O)
  where
    O: Subscriber<Vec<S::Item>, S::Err> + Send + 'static,
  {
    let outlet = Outlet::new(Box::new(subscriber));
    let upstream = Arc::new(Upstream::new());
    outlet.set_producer(upstream.clone());
    outlet.start();
    upstream.request(Demand::unlimited());
    self.source.subscribe(CollectRelay {
      outlet,
      upstream,
      buffer: Vec::new(),
      count: self.count,
    });
  }
}

struct CollectRelay<Item, Err> {
  outlet: Arc<Outlet<Vec<Item>, Err>>,
  upstream: Arc<Upstream>,
  buffer: Vec<Item>,
  count: Option<usize>,
}

impl<Item, Err> Subscriber<Item, Err> for CollectRelay<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    self.upstream.set(subscription);
  }

  fn receive(&mut self, value: Item) -> Demand {
    self.buffer.push(value);
    if self.count.is_some_and(|count| self.buffer.len() >= count) {
      self.outlet.push(std::mem::take(&mut self.buffer));
    }
    Demand::none()
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.upstream.release();
    let buffer = std::mem::take(&mut self.buffer);
    if completion.is_finished() && (self.count.is_none() || !buffer.is_empty()) {
      self.outlet.push(buffer);
    }
    self.outlet.complete(completion);
  }
}
