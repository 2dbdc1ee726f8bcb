//! SwitchToLatest operator implementation
//!
//! Flattens a publisher of publishers by following only the most recent
//! inner publisher. Each new inner publisher cancels its predecessor; values
//! a superseded inner still produces are ignored. Downstream demand the
//! previous inner left unanswered carries over to the next one.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

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

/// Publisher returned by
/// [`switch_to_latest`](crate::publisher::PublisherExt::switch_to_latest).
#[derive(Clone)]
pub struct SwitchToLatest<S> {
  source: S,
}

impl<S> SwitchToLatest<S> {
  pub(crate) fn new(source: S) -> Self { SwitchToLatest { source } }
}

impl<S> Publisher for SwitchToLatest<S>
where
  S: Publisher,
  S::Item: Publisher<Err = S::Err>,
{
  type Item = <S::Item as Publisher>::Item;
  type Err = S::Err;

  fn subscribe<O>(self, subscriber: O)
  where
    O: Subscriber<Self::Item, S::Err> + Send + 'static,
  {
    let outlet = Outlet::new(Box::new(subscriber));
    let switch = Arc::new(Switch {
      outlet: outlet.clone(),
      upstream: Upstream::new(),
      inner: Upstream::new(),
      state: Mutex::new(SwitchState::default()),
    });
    outlet.set_producer(switch.clone());
    outlet.start();
    switch.upstream.request(Demand::unlimited());
    self.source.subscribe(OuterRelay { switch });
  }
}

#[derive(Default)]
struct SwitchState {
  // bumped for every new inner publisher
  generation: u64,
  inner_active: bool,
  upstream_finished: bool,
  terminated: bool,
}

struct Switch<Item, Err> {
  outlet: Arc<Outlet<Item, Err>>,
  upstream: Upstream,
  // the active inner subscription, carrying downstream demand
  inner: Upstream,
  state: Mutex<SwitchState>,
}

impl<Item, Err> Switch<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn is_current(&self, generation: u64) -> bool {
    let state = self.state.lock();
    !state.terminated && state.generation == generation
  }

  fn finish_if_done(&self) {
    let mut state = self.state.lock();
    if state.terminated || state.inner_active || !state.upstream_finished {
      return;
    }
    state.terminated = true;
    drop(state);
    self.outlet.complete(Completion::Finished);
  }

  fn fail(&self, err: Err) {
    if self.terminate() {
      self.outlet.complete(Completion::Failed(err));
    }
  }

  fn terminate(&self) -> bool {
    {
      let mut state = self.state.lock();
      if state.terminated {
        return false;
      }
      state.terminated = true;
    }
    self.upstream.cancel();
    self.inner.cancel();
    true
  }
}

impl<Item, Err> Producer for Switch<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn on_demand(&self, demand: Demand) { self.inner.request(demand); }

  fn on_cancel(&self) { self.terminate(); }
}

struct OuterRelay<Item, Err> {
  switch: Arc<Switch<Item, Err>>,
}

impl<P> Subscriber<P, P::Err> for OuterRelay<P::Item, P::Err>
where
  P: Publisher,
{
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    self.switch.upstream.set(subscription);
  }

  fn receive(&mut self, publisher: P) -> Demand {
    let generation = {
      let mut state = self.switch.state.lock();
      if state.terminated {
        return Demand::none();
      }
      state.generation += 1;
      state.inner_active = true;
      state.generation
    };
    if let Some(previous) = self.switch.inner.handover() {
      trace!(generation, "switching to a newer inner publisher");
      previous.cancel();
    }
    publisher.subscribe(InnerRelay { switch: self.switch.clone(), generation });
    Demand::none()
  }

  fn receive_completion(&mut self, completion: Completion<P::Err>) {
    match completion {
      Completion::Finished => {
        self.switch.upstream.release();
        self.switch.state.lock().upstream_finished = true;
        self.switch.finish_if_done();
      }
      Completion::Failed(err) => self.switch.fail(err),
    }
  }
}

struct InnerRelay<Item, Err> {
  switch: Arc<Switch<Item, Err>>,
  generation: u64,
}

impl<Item, Err> Subscriber<Item, Err> for InnerRelay<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    if self.switch.is_current(self.generation) {
      self.switch.inner.set(subscription);
    } else {
      subscription.cancel();
    }
  }

  fn receive(&mut self, value: Item) -> Demand {
    if self.switch.is_current(self.generation) {
      self.switch.inner.consumed();
      self.switch.outlet.push(value);
    }
    Demand::none()
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    if !self.switch.is_current(self.generation) {
      return;
    }
    match completion {
      Completion::Finished => {
        self.switch.inner.release();
        self.switch.state.lock().inner_active = false;
        self.switch.finish_if_done();
      }
      Completion::Failed(err) => self.switch.fail(err),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    publisher::{from_iter, PublisherExt},
    subject::PassthroughSubject,
    test_util::{recorder, Event},
  };
  use std::convert::Infallible;

  type Inner = PassthroughSubject<i32, &'static str>;

  #[test]
  fn follows_the_latest_inner() {
    let first = Inner::new();
    let second = Inner::new();
    let outer = PassthroughSubject::<Inner, &str>::new();
    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    outer.clone().switch_to_latest().subscribe(subscriber);

    outer.send(first.clone());
    first.send(1);
    outer.send(second.clone());
    first.send(2);
    second.send(3);
    assert_eq!(probe.values(), vec![1, 3]);
    assert_eq!(first.subscriber_count(), 0);
  }

  #[test]
  fn finishes_after_outer_and_active_inner() {
    let inner = Inner::new();
    let outer = PassthroughSubject::<Inner, &str>::new();
    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    outer.clone().switch_to_latest().subscribe(subscriber);

    outer.send(inner.clone());
    outer.send_completion(Completion::Finished);
    assert_eq!(probe.completion(), None);
    inner.send(1);
    inner.send_completion(Completion::Finished);
    assert_eq!(
      probe.events(),
      vec![Event::Value(1), Event::Completion(Completion::Finished)]
    );
  }

  #[test]
  fn demand_carries_over_to_the_next_inner() {
    let (subscriber, probe) = recorder(Demand::max(3), Demand::none());
    let outer = PassthroughSubject::<_, Infallible>::new();
    outer.clone().switch_to_latest().subscribe(subscriber);

    outer.send(from_iter(vec![1]).erase());
    outer.send(from_iter(vec![2, 3, 4]).erase());
    assert_eq!(probe.values(), vec![1, 2, 3]);
    probe.request(Demand::max(1));
    assert_eq!(probe.values(), vec![1, 2, 3, 4]);
  }

  #[test]
  fn inner_failure_is_forwarded() {
    let inner = Inner::new();
    let outer = PassthroughSubject::<Inner, &str>::new();
    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    outer.clone().switch_to_latest().subscribe(subscriber);

    outer.send(inner.clone());
    inner.send_completion(Completion::Failed("inner"));
    assert_eq!(probe.events(), vec![Event::Completion(Completion::Failed("inner"))]);
    assert_eq!(outer.subscriber_count(), 0);
  }

  #[test]
  fn cancel_reaches_outer_and_active_inner() {
    let inner = Inner::new();
    let outer = PassthroughSubject::<Inner, &str>::new();
    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    outer.clone().switch_to_latest().subscribe(subscriber);
    outer.send(inner.clone());
    assert_eq!((outer.subscriber_count(), inner.subscriber_count()), (1, 1));

    probe.cancel();
    assert_eq!((outer.subscriber_count(), inner.subscriber_count()), (0, 0));
    inner.send(1);
    assert!(probe.events().is_empty());
  }
}
