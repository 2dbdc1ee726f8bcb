use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::{
    outlet::{Outlet, Producer},
    upstream::Upstream,
    Subscription, SubscriptionRef,
  },
};

/// Publisher returned by [`prepend`](crate::publisher::PublisherExt::prepend).
///
/// The prefix is drained completely before the main publisher is subscribed;
/// demand the prefix left unanswered carries over to the main publisher.
#[derive(Clone)]
pub struct Prepend<P, S> {
  prefix: P,
  source: S,
}

impl<P, S> Prepend<P, S> {
  pub(crate) fn new(prefix: P, source: S) -> Self { Prepend { prefix, source } }
}

impl<P, S> Publisher for Prepend<P, S>
where
  P: Publisher,
  S: Publisher<Item = P::Item, Err = P::Err> + Send + 'static,
{
  type Item = P::Item;
  type Err = P::Err;

  fn subscribe<O>(self, subscriber: O)
  where
    O: Subscriber<P::Item, P::Err> + Send + 'static,
  {
    let outlet = Outlet::new(Box::new(subscriber));
    let chain = Arc::new(Chain {
      outlet: outlet.clone(),
      current: Upstream::new(),
      source: Mutex::new(Some(self.source)),
    });
    outlet.set_producer(chain.clone());
    outlet.start();
    self
      .prefix
      .subscribe(ChainRelay { chain, stage: Stage::Prefix });
  }
}

struct Chain<S: Publisher> {
  outlet: Arc<Outlet<S::Item, S::Err>>,
  // whichever half is currently attached
  current: Upstream,
  // taken when the prefix finishes
  source: Mutex<Option<S>>,
}

impl<S> Producer for Chain<S>
where
  S: Publisher + Send + 'static,
{
  fn on_demand(&self, demand: Demand) { self.current.request(demand); }

  fn on_cancel(&self) {
    self.current.cancel();
    self.source.lock().take();
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
  Prefix,
  Main,
}

struct ChainRelay<S: Publisher> {
  chain: Arc<Chain<S>>,
  stage: Stage,
}

impl<S> Subscriber<S::Item, S::Err> for ChainRelay<S>
where
  S: Publisher + Send + 'static,
{
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    self.chain.current.set(subscription);
  }

  fn receive(&mut self, value: S::Item) -> Demand {
    self.chain.current.consumed();
    self.chain.outlet.push(value);
    Demand::none()
  }

  fn receive_completion(&mut self, completion: Completion<S::Err>) {
    if self.stage == Stage::Main || completion.is_failed() {
      self.chain.current.release();
      self.chain.outlet.complete(completion);
      return;
    }
    self.chain.current.handover();
    let source = self.chain.source.lock().take();
    if let Some(source) = source {
      if !self.chain.current.is_cancelled() {
        source.subscribe(ChainRelay { chain: self.chain.clone(), stage: Stage::Main });
      }
    }
  }
}
