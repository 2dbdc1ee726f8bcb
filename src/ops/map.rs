use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::SubscriptionRef,
};

/// Publisher returned by [`map`](crate::publisher::PublisherExt::map).
#[derive(Clone)]
pub struct Map<S, F> {
  source: S,
  func: F,
}

impl<S, F> Map<S, F> {
  pub(crate) fn new(source: S, func: F) -> Self { Map { source, func } }
}

impl<S, F, B> Publisher for Map<S, F>
where
  S: Publisher,
  F: FnMut(S::Item) -> B + Send + 'static,
  B: Send + 'static,
{
  type Item = B;
  type Err = S::Err;

  fn subscribe<O>(self, subscriber: O)
  where
    O: Subscriber<B, S::Err> + Send + 'static,
  {
    self
      .source
      .subscribe(MapSubscriber { subscriber, func: self.func })
  }
}

/// Demand and the subscription pass through untouched; only values change.
pub struct MapSubscriber<O, F> {
  subscriber: O,
  func: F,
}

impl<Item, Err, B, O, F> Subscriber<Item, Err> for MapSubscriber<O, F>
where
  O: Subscriber<B, Err>,
  F: FnMut(Item) -> B,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    self.subscriber.receive_subscription(subscription)
  }

  #[inline]
  fn receive(&mut self, value: Item) -> Demand { self.subscriber.receive((self.func)(value)) }

  #[inline]
  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.subscriber.receive_completion(completion)
  }
}

#[cfg(test)]
mod tests {
  use crate::{
    demand::Demand,
    publisher::{from_iter, Publisher, PublisherExt},
    subscriber::Completion,
    test_util::recorder,
  };

  #[test]
  fn primitive_type() {
    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    from_iter(100..103).map(|v| v * 2).subscribe(subscriber);
    assert_eq!(probe.values(), vec![200, 202, 204]);
    assert_eq!(probe.completion(), Some(Completion::Finished));
  }

  #[test]
  fn demand_is_one_to_one() {
    let (subscriber, probe) = recorder(Demand::max(1), Demand::none());
    from_iter(vec!["a", "bb", "ccc"])
      .map(str::len)
      .subscribe(subscriber);
    assert_eq!(probe.values(), vec![1]);
    probe.request(Demand::max(1));
    assert_eq!(probe.values(), vec![1, 2]);
  }

  #[test]
  fn chained_maps_change_type() {
    let (subscriber, probe) = recorder(Demand::unlimited(), Demand::none());
    from_iter(1..=3)
      .map(|v| v as f64 / 2.)
      .map(|v| format!("{v:.1}"))
      .subscribe(subscriber);
    assert_eq!(probe.values(), vec!["0.5", "1.0", "1.5"]);
  }
}
