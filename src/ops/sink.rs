//! Closure-based subscribers behind `sink`, `sink_value`, `assign` and
//! `assign_to`.

use std::sync::Arc;

use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::{upstream::Upstream, AnyCancellable, Subscription, SubscriptionRef},
};

pub(crate) struct SinkFns<N, C> {
  on_value: N,
  on_completion: Option<C>,
}

impl<N, C> SinkFns<N, C> {
  pub(crate) fn new(on_value: N, on_completion: C) -> Self {
    SinkFns { on_value, on_completion: Some(on_completion) }
  }
}

/// Subscribes `fns` to `publisher` with unlimited demand. The returned
/// handle cancels the subscription when cancelled or dropped.
pub(crate) fn attach<P, N, C>(publisher: P, fns: SinkFns<N, C>) -> AnyCancellable
where
  P: Publisher,
  N: FnMut(P::Item) + Send + 'static,
  C: FnOnce(Completion<P::Err>) + Send + 'static,
{
  let upstream = Arc::new(Upstream::new());
  upstream.request(Demand::unlimited());
  publisher.subscribe(Sink { upstream: upstream.clone(), fns });
  AnyCancellable::from_ref(upstream)
}

struct Sink<N, C> {
  upstream: Arc<Upstream>,
  fns: SinkFns<N, C>,
}

impl<Item, Err, N, C> Subscriber<Item, Err> for Sink<N, C>
where
  N: FnMut(Item),
  C: FnOnce(Completion<Err>),
{
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    self.upstream.set(subscription);
  }

  fn receive(&mut self, value: Item) -> Demand {
    (self.fns.on_value)(value);
    Demand::none()
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.upstream.release();
    if let Some(on_completion) = self.fns.on_completion.take() {
      on_completion(completion);
    }
  }
}
