//! Subscription trait and the building blocks publishers use to honour it
//!
//! A [`Subscription`] is the control handle a subscriber holds for one
//! attachment: it grants demand with [`request`](Subscription::request) and
//! ends the attachment with [`cancel`](Subscription::cancel).

use std::sync::Arc;

use crate::demand::Demand;

mod cancellable;
pub(crate) mod outlet;
pub(crate) mod slots;
pub(crate) mod upstream;

pub use cancellable::{AnyCancellable, Cancellables};

/// Per-attachment control handle.
///
/// Both methods may be called from any thread and re-entrantly from inside
/// subscriber callbacks. Once cancelled (or once the stream has completed)
/// every further call is a silent no-op.
pub trait Subscription: Send + Sync {
  /// Adds `demand` to the outstanding demand. `Demand::none()` has no effect.
  fn request(&self, demand: Demand);

  /// Stops delivery and releases the producer's resources. Idempotent.
  fn cancel(&self);
}

/// Shared handle to a subscription, as handed to subscribers.
pub type SubscriptionRef = Arc<dyn Subscription>;

impl<T: Subscription + ?Sized> Subscription for Arc<T> {
  #[inline]
  fn request(&self, demand: Demand) { (**self).request(demand) }

  #[inline]
  fn cancel(&self) { (**self).cancel() }
}

impl<T: Subscription + ?Sized> Subscription for Box<T> {
  #[inline]
  fn request(&self, demand: Demand) { (**self).request(demand) }

  #[inline]
  fn cancel(&self) { (**self).cancel() }
}
