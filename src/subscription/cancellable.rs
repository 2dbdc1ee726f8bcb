use std::fmt::{Debug, Formatter};

use super::{Subscription, SubscriptionRef};

/// Cancellation handle returned by the `sink`/`assign` family.
///
/// The subscription is cancelled by [`cancel`](Self::cancel) or, at the
/// latest, when the handle is dropped.
///
/// **Attention:** binding the result to `_` drops it immediately, which
/// cancels the subscription right away.
#[must_use]
pub struct AnyCancellable(Option<SubscriptionRef>);

impl AnyCancellable {
  pub fn new(subscription: impl Subscription + 'static) -> Self {
    AnyCancellable(Some(std::sync::Arc::new(subscription)))
  }

  pub fn from_ref(subscription: SubscriptionRef) -> Self { AnyCancellable(Some(subscription)) }

  pub fn cancel(&mut self) {
    if let Some(subscription) = self.0.take() {
      subscription.cancel();
    }
  }

  pub fn is_cancelled(&self) -> bool { self.0.is_none() }

  /// Moves the handle into `bag`, tying its lifetime to the bag's.
  pub fn store(self, bag: &mut Cancellables) { bag.insert(self); }
}

impl Drop for AnyCancellable {
  fn drop(&mut self) { self.cancel(); }
}

impl Debug for AnyCancellable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AnyCancellable")
      .field("is_cancelled", &self.is_cancelled())
      .finish()
  }
}

/// An owning set of cancellation handles.
///
/// Dropping the bag cancels every member, in insertion order.
#[derive(Debug, Default)]
pub struct Cancellables(Vec<AnyCancellable>);

impl Cancellables {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, cancellable: AnyCancellable) { self.0.push(cancellable); }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn cancel_all(&mut self) {
    for mut cancellable in self.0.drain(..) {
      cancellable.cancel();
    }
  }
}

impl Drop for Cancellables {
  fn drop(&mut self) { self.cancel_all(); }
}

impl Extend<AnyCancellable> for Cancellables {
  fn extend<T: IntoIterator<Item = AnyCancellable>>(&mut self, iter: T) { self.0.extend(iter); }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::demand::Demand;
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  struct Counted(Arc<AtomicUsize>);

  impl Subscription for Counted {
    fn request(&self, _demand: Demand) {}
    fn cancel(&self) { self.0.fetch_add(1, Ordering::SeqCst); }
  }

  #[test]
  fn drop_cancels() {
    let hits = Arc::new(AtomicUsize::new(0));
    {
      let _handle = AnyCancellable::new(Counted(hits.clone()));
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn explicit_cancel_happens_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut handle = AnyCancellable::new(Counted(hits.clone()));
    handle.cancel();
    handle.cancel();
    drop(handle);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn bag_cancels_members_on_drop() {
    let hits = Arc::new(AtomicUsize::new(0));
    {
      let mut bag = Cancellables::new();
      AnyCancellable::new(Counted(hits.clone())).store(&mut bag);
      AnyCancellable::new(Counted(hits.clone())).store(&mut bag);
      assert_eq!(bag.len(), 2);
      assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 2);
  }
}
