//! FlatMap operator implementation
//!
//! Every upstream value is turned into an inner publisher; all inner
//! publishers are subscribed concurrently and their values merged in arrival
//! order. Inner subscriptions request unlimited values, which the downstream
//! outlet buffers until demand allows.

use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::trace;

use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::{
    outlet::{Outlet, Producer},
    upstream::Upstream,
    slots::Slots,
    Subscription, SubscriptionRef,
  },
};

/// Publisher returned by [`flat_map`](crate::publisher::PublisherExt::flat_map)
/// and [`flat_map_max`](crate::publisher::PublisherExt::flat_map_max).
#[derive(Clone)]
pub struct FlatMap<S, F> {
  source: S,
  max_publishers: Demand,
  func: F,
}

impl<S, F> FlatMap<S, F> {
  pub(crate) fn new(source: S, max_publishers: Demand, func: F) -> Self {
    FlatMap { source, max_publishers, func }
  }
}

impl<S, F, P> Publisher for FlatMap<S, F>
where
  S: Publisher,
  F: FnMut(S::Item) -> P + Send + 'static,
  P: Publisher<Err = S::Err>,
{
  type Item = P::Item;
  type Err = S::Err;

  fn subscribe<O>(self, subscriber: O)
  where
    O: Subscriber<P::Item, S::Err> + Send + 'static,
  {
    let outlet = Outlet::new(Box::new(subscriber));
    let merge = Arc::new(Merge {
      outlet: outlet.clone(),
      upstream: Upstream::new(),
      state: Mutex::new(MergeState {
        inners: Slots::default(),
        upstream_finished: false,
        terminated: false,
      }),
    });
    outlet.set_producer(merge.clone());
    outlet.start();
    merge.upstream.request(self.max_publishers);
    self.source.subscribe(OuterRelay { merge, func: self.func });
  }
}

// ============================================================================
// Merge State
// ============================================================================

struct MergeState {
  // `None` until the inner publisher hands over its subscription
  inners: Slots<Option<SubscriptionRef>>,
  upstream_finished: bool,
  terminated: bool,
}

struct Merge<Item, Err> {
  outlet: Arc<Outlet<Item, Err>>,
  upstream: Upstream,
  state: Mutex<MergeState>,
}

impl<Item, Err> Merge<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn finish_if_done(&self) {
    let mut state = self.state.lock();
    if state.terminated || !state.upstream_finished || !state.inners.is_empty() {
      return;
    }
    state.terminated = true;
    drop(state);
    self.outlet.complete(Completion::Finished);
  }

  fn fail(&self, err: Err) {
    let inners = self.terminate();
    if let Some(inners) = inners {
      trace!(inners = inners.len(), "flat_map failed, cancelling inner subscriptions");
      self.outlet.complete(Completion::Failed(err));
    }
  }

  // Cancels everything still attached. `None` if already terminated.
  fn terminate(&self) -> Option<SmallVec<[SubscriptionRef; 2]>> {
    let inners: SmallVec<[SubscriptionRef; 2]> = {
      let mut state = self.state.lock();
      if state.terminated {
        return None;
      }
      state.terminated = true;
      state.inners.take_all().flatten().collect()
    };
    self.upstream.cancel();
    for inner in inners.iter() {
      inner.cancel();
    }
    Some(inners)
  }
}

impl<Item, Err> Producer for Merge<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  // Inner values are buffered by the outlet; downstream demand needs no
  // forwarding.
  fn on_demand(&self, _demand: Demand) {}

  fn on_cancel(&self) { self.terminate(); }
}

// ============================================================================
// Relays
// ============================================================================

struct OuterRelay<Item, Err, F> {
  merge: Arc<Merge<Item, Err>>,
  func: F,
}

impl<In, Item, Err, F, P> Subscriber<In, Err> for OuterRelay<Item, Err, F>
where
  F: FnMut(In) -> P,
  P: Publisher<Item = Item, Err = Err>,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    self.merge.upstream.set(subscription);
  }

  fn receive(&mut self, value: In) -> Demand {
    let id = {
      let mut state = self.merge.state.lock();
      if state.terminated {
        return Demand::none();
      }
      state.inners.attach(None)
    };
    (self.func)(value).subscribe(InnerRelay { merge: self.merge.clone(), id });
    Demand::none()
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    match completion {
      Completion::Finished => {
        self.merge.upstream.release();
        self.merge.state.lock().upstream_finished = true;
        self.merge.finish_if_done();
      }
      Completion::Failed(err) => self.merge.fail(err),
    }
  }
}

struct InnerRelay<Item, Err> {
  merge: Arc<Merge<Item, Err>>,
  id: usize,
}

impl<Item, Err> Subscriber<Item, Err> for InnerRelay<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    let attached = {
      let mut state = self.merge.state.lock();
      if state.terminated {
        false
      } else if let Some(slot) = state.inners.get_mut(self.id) {
        *slot = Some(subscription.clone());
        true
      } else {
        false
      }
    };
    if attached {
      subscription.request(Demand::unlimited());
    } else {
      subscription.cancel();
    }
  }

  fn receive(&mut self, value: Item) -> Demand {
    self.merge.outlet.push(value);
    Demand::none()
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    match completion {
      Completion::Finished => {
        let removed = self.merge.state.lock().inners.detach(self.id);
        if removed.is_some() {
          self.merge.upstream.request(Demand::max(1));
          self.merge.finish_if_done();
        }
      }
      Completion::Failed(err) => self.merge.fail(err),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    publisher::{fail, from_iter, just, PublisherExt},
    subject::PassthroughSubject,
    test_util::{recorder, Event},
  };
  use std::convert::Infallible;

  #[test]
  fn merges_inner_values() {
    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    from_iter(1..=3)
      .flat_map(|v| from_iter(vec![v * 10, v * 10 + 1]))
      .subscribe(subscriber);
    assert_eq!(probe.values(), vec![10, 11, 20, 21, 30, 31]);
    assert_eq!(probe.completion(), Some(Completion::Finished));
  }

  #[test]
  fn waits_for_inners_before_finishing() {
    let inner = PassthroughSubject::<&str, Infallible>::new();
    let source = inner.clone();
    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    just(()).flat_map(move |_| source.clone()).subscribe(subscriber);

    inner.send("late");
    assert_eq!(probe.completion(), None);
    inner.send_completion(Completion::Finished);
    assert_eq!(
      probe.events(),
      vec![Event::Value("late"), Event::Completion(Completion::Finished)]
    );
  }

  #[test]
  fn inner_failure_cancels_siblings() {
    let first = PassthroughSubject::<i32, &str>::new();
    let second = PassthroughSubject::<i32, &str>::new();
    let outer = PassthroughSubject::<PassthroughSubject<i32, &str>, &str>::new();
    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    outer.clone().flat_map(|p| p).subscribe(subscriber);

    outer.send(first.clone());
    outer.send(second.clone());
    first.send(1);
    second.send_completion(Completion::Failed("boom"));
    first.send(2);

    assert_eq!(
      probe.events(),
      vec![Event::Value(1), Event::Completion(Completion::Failed("boom"))]
    );
    assert_eq!(first.subscriber_count(), 0);
    assert_eq!(outer.subscriber_count(), 0);
  }

  #[test]
  fn max_publishers_limits_upstream_demand() {
    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    let inners = Arc::new(Mutex::new(Vec::new()));
    let created = inners.clone();
    from_iter(0..3)
      .flat_map_max(Demand::max(1), move |v| {
        let subject = PassthroughSubject::<i32, Infallible>::new();
        created.lock().push(subject.clone());
        subject.map(move |x| x + v * 100)
      })
      .subscribe(subscriber);

    assert_eq!(inners.lock().len(), 1);
    let first = inners.lock()[0].clone();
    first.send(1);
    first.send_completion(Completion::Finished);
    assert_eq!(inners.lock().len(), 2);
    assert_eq!(probe.values(), vec![1]);
  }

  #[test]
  fn outer_failure_is_forwarded() {
    let (subscriber, probe) = recorder::<i32, &str>(Demand::unlimited(), Demand::none());
    fail::<i32, &str>("outer")
      .flat_map(|_: i32| fail::<i32, &str>("inner"))
      .subscribe(subscriber);
    assert_eq!(probe.events(), vec![Event::Completion(Completion::Failed("outer"))]);
  }

  #[test]
  fn cancel_reaches_outer_and_every_inner() {
    let first = PassthroughSubject::<i32, &str>::new();
    let second = PassthroughSubject::<i32, &str>::new();
    let outer = PassthroughSubject::<PassthroughSubject<i32, &str>, &str>::new();
    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    outer.clone().flat_map(|p| p).subscribe(subscriber);
    outer.send(first.clone());
    outer.send(second.clone());
    let counts = || (outer.subscriber_count(), first.subscriber_count(), second.subscriber_count());
    assert_eq!(counts(), (1, 1, 1));

    probe.cancel();
    assert_eq!(counts(), (0, 0, 0));
    first.send(1);
    assert!(probe.events().is_empty());
  }

  #[test]
  fn downstream_demand_bounds_delivery() {
    let (subscriber, probe) = recorder(Demand::max(2), Demand::none());
    from_iter(1..=3)
      .flat_map(|v| from_iter(vec![v; 3]))
      .subscribe(subscriber);
    assert_eq!(probe.values(), vec![1, 1]);
    assert_eq!(probe.completion(), None);

    probe.request(Demand::max(10));
    assert_eq!(probe.values(), vec![1, 1, 1, 2, 2, 2, 3, 3, 3]);
    assert_eq!(probe.completion(), Some(Completion::Finished));
  }
}
