//! Slot for a subscription that may not have arrived yet.

use parking_lot::Mutex;

use super::{outlet::Producer, Subscription, SubscriptionRef};
use crate::demand::Demand;

#[derive(Default)]
struct UpstreamState {
  subscription: Option<SubscriptionRef>,
  // requested while no subscription was attached
  pending: Demand,
  // requested in total and not yet answered with a value
  outstanding: Demand,
  cancelled: bool,
}

/// Holds the upstream side of a relay.
///
/// Demand requested before the upstream subscription arrives is kept and
/// forwarded on [`set`](Upstream::set); a cancel before that point cancels the
/// subscription as soon as it shows up. [`handover`](Upstream::handover)
/// detaches the current upstream so the unanswered demand carries over to the
/// next one.
#[derive(Default)]
pub(crate) struct Upstream {
  state: Mutex<UpstreamState>,
}

impl Upstream {
  pub(crate) fn new() -> Self { Self::default() }

  pub(crate) fn set(&self, subscription: SubscriptionRef) {
    let mut state = self.state.lock();
    if state.cancelled {
      drop(state);
      subscription.cancel();
      return;
    }
    let pending = std::mem::take(&mut state.pending);
    let previous = state.subscription.replace(subscription.clone());
    drop(state);
    if let Some(previous) = previous {
      previous.cancel();
    }
    if pending.is_positive() {
      subscription.request(pending);
    }
  }

  /// Records that the current upstream delivered one value.
  pub(crate) fn consumed(&self) { self.state.lock().outstanding.take_one(); }

  /// Detaches the current upstream and returns it for cancellation.
  pub(crate) fn handover(&self) -> Option<SubscriptionRef> {
    let mut state = self.state.lock();
    state.pending = state.outstanding;
    state.subscription.take()
  }

  /// Forgets the current upstream after it completed.
  pub(crate) fn release(&self) { self.state.lock().subscription = None; }

  pub(crate) fn is_cancelled(&self) -> bool { self.state.lock().cancelled }
}

impl Subscription for Upstream {
  fn request(&self, demand: Demand) {
    if demand.is_zero() {
      return;
    }
    let mut state = self.state.lock();
    if state.cancelled {
      return;
    }
    state.outstanding += demand;
    match state.subscription.clone() {
      Some(subscription) => {
        drop(state);
        subscription.request(demand);
      }
      None => state.pending += demand,
    }
  }

  fn cancel(&self) {
    let mut state = self.state.lock();
    if state.cancelled {
      return;
    }
    state.cancelled = true;
    let subscription = state.subscription.take();
    drop(state);
    if let Some(subscription) = subscription {
      subscription.cancel();
    }
  }
}

/// Relays that own a downstream outlet pass its demand and cancellation
/// straight through.
impl Producer for Upstream {
  fn on_demand(&self, demand: Demand) { self.request(demand); }

  fn on_cancel(&self) { self.cancel(); }
}
