use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::SubscriptionRef,
};

/// Publisher returned by
/// [`replace_nil`](crate::publisher::PublisherExt::replace_nil).
#[derive(Clone)]
pub struct ReplaceNil<S, T> {
  source: S,
  default: T,
}

impl<S, T> ReplaceNil<S, T> {
  pub(crate) fn new(source: S, default: T) -> Self { ReplaceNil { source, default } }
}

impl<S, T> Publisher for ReplaceNil<S, T>
where
  S: Publisher<Item = Option<T>>,
  T: Clone + Send + 'static,
{
  type Item = T;
  type Err = S::Err;

  fn subscribe<O>(self, subscriber: O)
  where
    O: Subscriber<T, S::Err> + Send + 'static,
  {
    self
      .source
      .subscribe(ReplaceNilSubscriber { subscriber, default: self.default })
  }
}

pub struct ReplaceNilSubscriber<O, T> {
  subscriber: O,
  default: T,
}

impl<O, T, Err> Subscriber<Option<T>, Err> for ReplaceNilSubscriber<O, T>
where
  O: Subscriber<T, Err>,
  T: Clone,
{
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    self.subscriber.receive_subscription(subscription)
  }

  fn receive(&mut self, value: Option<T>) -> Demand {
    let value = value.unwrap_or_else(|| self.default.clone());
    self.subscriber.receive(value)
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.subscriber.receive_completion(completion)
  }
}
