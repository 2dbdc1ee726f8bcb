use std::sync::Arc;

use smallvec::SmallVec;

use crate::{
  subscriber::Completion,
  subscription::{outlet::Outlet, slots::Slots},
};

struct Attached<Item, Err> {
  outlet: Arc<Outlet<Item, Err>>,
  // the retained value has not been replayed yet; live sends skip this outlet
  replay_pending: bool,
}

/// The outlets attached to a subject, keyed by attachment id.
pub(crate) struct Subscribers<Item, Err> {
  attached: Slots<Attached<Item, Err>>,
}

impl<Item, Err> Default for Subscribers<Item, Err> {
  fn default() -> Self { Self { attached: Slots::default() } }
}

impl<Item, Err> Subscribers<Item, Err> {
  pub(crate) fn attach(&mut self, outlet: Arc<Outlet<Item, Err>>, replay_pending: bool) -> usize {
    self.attached.attach(Attached { outlet, replay_pending })
  }

  pub(crate) fn detach(&mut self, id: usize) -> Option<Arc<Outlet<Item, Err>>> {
    self.attached.detach(id).map(|attached| attached.outlet)
  }

  /// Clears the pending replay of `id`. `true` if it was still pending.
  pub(crate) fn take_replay(&mut self, id: usize) -> bool {
    match self.attached.get_mut(id) {
      Some(attached) => std::mem::replace(&mut attached.replay_pending, false),
      None => false,
    }
  }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.attached.len() }

  /// Copies the outlets that accept live values so they can be fed after the
  /// subject lock is released.
  pub(crate) fn snapshot(&self) -> Snapshot<Item, Err> {
    Snapshot(
      self
        .attached
        .iter()
        .filter(|attached| !attached.replay_pending)
        .map(|attached| attached.outlet.clone())
        .collect(),
    )
  }

  /// Detaches every outlet.
  pub(crate) fn take_all(&mut self) -> Snapshot<Item, Err> {
    Snapshot(self.attached.take_all().map(|attached| attached.outlet).collect())
  }
}

/// Outlets captured under the subject lock, fed outside of it.
pub(crate) struct Snapshot<Item, Err>(SmallVec<[Arc<Outlet<Item, Err>>; 2]>);

impl<Item, Err> Snapshot<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  /// Offers `value` to every outlet, cloning for all but the last one.
  /// Returns how many outlets had no demand for it.
  pub(crate) fn broadcast_value(self, value: Item) -> usize {
    let mut missed = 0;
    let mut iter = self.0.into_iter().peekable();
    while let Some(outlet) = iter.next() {
      if iter.peek().is_some() {
        if !outlet.offer(value.clone()) {
          missed += 1;
        }
      } else {
        if !outlet.offer(value) {
          missed += 1;
        }
        break;
      }
    }
    missed
  }

  pub(crate) fn broadcast_completion(self, completion: Completion<Err>) {
    for outlet in self.0 {
      outlet.complete(completion.clone());
    }
  }
}
