use std::sync::Arc;

use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::{outlet::Outlet, upstream::Upstream, SubscriptionRef},
};

/// Publisher returned by
/// [`replace_empty`](crate::publisher::PublisherExt::replace_empty).
pub struct ReplaceEmpty<S: Publisher> {
  source: S,
  default: S::Item,
}

impl<S> Clone for ReplaceEmpty<S>
where
  S: Publisher + Clone,
  S::Item: Clone,
{
  fn clone(&self) -> Self {
    ReplaceEmpty { source: self.source.clone(), default: self.default.clone() }
  }
}

impl<S: Publisher> ReplaceEmpty<S> {
  pub(crate) fn new(source: S, default: S::Item) -> Self { ReplaceEmpty { source, default } }
}

impl<S: Publisher> Publisher for ReplaceEmpty<S> {
  type Item = S::Item;
  type Err = S::Err;

  fn subscribe<O>(self, subscriber: O)
  where
    O: Subscriber<S::Item, S::Err> + Send + 'static,
  {
    let outlet = Outlet::new(Box::new(subscriber));
    let upstream = Arc::new(Upstream::new());
    outlet.set_producer(upstream.clone());
    outlet.start();
    self.source.subscribe(ReplaceEmptyRelay {
      outlet,
      upstream,
      default: Some(self.default),
    });
  }
}

struct ReplaceEmptyRelay<Item, Err> {
  outlet: Arc<Outlet<Item, Err>>,
  upstream: Arc<Upstream>,
  // taken by the first value
  default: Option<Item>,
}

impl<Item, Err> Subscriber<Item, Err> for ReplaceEmptyRelay<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    self.upstream.set(subscription);
  }

  fn receive(&mut self, value: Item) -> Demand {
    self.default = None;
    self.outlet.push(value);
    Demand::none()
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.upstream.release();
    if completion.is_finished() {
      if let Some(default) = self.default.take() {
        self.outlet.push(default);
      }
    }
    self.outlet.complete(completion);
  }
}
