use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc, Weak,
};

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::subscribers::Subscribers;
use crate::{
  demand::Demand,
  error::{Result, SubjectError},
  subscriber::{BoxedSubscriber, Completion},
  subscription::outlet::{Outlet, Producer},
};

// ============================================================================
// Retained State
// ============================================================================

/// What a subject keeps besides its subscribers.
pub(crate) trait Retain<Item>: Send {
  /// Whether new subscribers get [`replay`](Self::replay) on first demand.
  const REPLAYS: bool;

  /// Called with every accepted value, before it is broadcast.
  fn update(&mut self, value: &Item);

  /// The value a new subscriber receives on its first demand, if any.
  fn replay(&self) -> Option<Item>;
}

/// Pass-through subjects retain nothing.
impl<Item> Retain<Item> for () {
  const REPLAYS: bool = false;

  fn update(&mut self, _value: &Item) {}

  fn replay(&self) -> Option<Item> { None }
}

/// The latest value of a current-value subject.
pub(crate) struct Latest<Item>(pub(crate) Item);

impl<Item: Clone + Send> Retain<Item> for Latest<Item> {
  const REPLAYS: bool = true;

  fn update(&mut self, value: &Item) { self.0 = value.clone(); }

  fn replay(&self) -> Option<Item> { Some(self.0.clone()) }
}

// ============================================================================
// SubjectCore
// ============================================================================

struct SubjectState<Item, Err, R> {
  subscribers: Subscribers<Item, Err>,
  completion: Option<Completion<Err>>,
  retained: R,
}

/// Shared state behind every handle of one subject.
///
/// Attach and detach happen under the lock. Sends capture the attached
/// outlets under the lock and feed them after releasing it, so subscribers
/// may send, subscribe or cancel from inside their callbacks.
pub(crate) struct SubjectCore<Item, Err, R> {
  state: Mutex<SubjectState<Item, Err, R>>,
}

impl<Item, Err, R> SubjectCore<Item, Err, R>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  R: Retain<Item> + 'static,
{
  pub(crate) fn new(retained: R) -> Arc<Self> {
    Arc::new(SubjectCore {
      state: Mutex::new(SubjectState {
        subscribers: Subscribers::default(),
        completion: None,
        retained,
      }),
    })
  }

  /// Attaches under the subject lock, then hands out the subscription. A
  /// subject that already completed delivers its stored completion instead.
  pub(crate) fn attach(self: &Arc<Self>, subscriber: BoxedSubscriber<Item, Err>) {
    let outlet = Outlet::new(subscriber);
    let stored = {
      let mut state = self.state.lock();
      match state.completion.clone() {
        Some(completion) => Some(completion),
        None => {
          let id = state.subscribers.attach(outlet.clone(), R::REPLAYS);
          outlet.set_producer(Arc::new(SubjectLink {
            core: Arc::downgrade(self),
            outlet: Arc::downgrade(&outlet),
            id,
            replay: AtomicBool::new(R::REPLAYS),
          }));
          None
        }
      }
    };
    outlet.start();
    if let Some(completion) = stored {
      trace!("late subscriber receives stored completion");
      outlet.complete(completion);
    }
  }

  pub(crate) fn try_send(&self, value: Item) -> Result<()> {
    let snapshot = {
      let mut state = self.state.lock();
      if state.completion.is_some() {
        trace!("value sent after completion ignored");
        return Err(SubjectError::Completed);
      }
      state.retained.update(&value);
      state.subscribers.snapshot()
    };
    let missed = snapshot.broadcast_value(value);
    if missed > 0 {
      trace!(missed, "value dropped for subscribers without demand");
    }
    Ok(())
  }

  pub(crate) fn try_send_completion(&self, completion: Completion<Err>) -> Result<()> {
    let snapshot = {
      let mut state = self.state.lock();
      if state.completion.is_some() {
        trace!("completion sent after completion ignored");
        return Err(SubjectError::Completed);
      }
      state.completion = Some(completion.clone());
      state.subscribers.take_all()
    };
    debug!(finished = completion.is_finished(), "subject completed");
    snapshot.broadcast_completion(completion);
    Ok(())
  }

  pub(crate) fn is_completed(&self) -> bool { self.state.lock().completion.is_some() }

  pub(crate) fn subscriber_count(&self) -> usize { self.state.lock().subscribers.len() }

  pub(crate) fn with_retained<T>(&self, f: impl FnOnce(&R) -> T) -> T {
    f(&self.state.lock().retained)
  }

  // The retained value is queued under the subject lock, so no live send can
  // reach the outlet ahead of it.
  fn replay(&self, id: usize, outlet: &Outlet<Item, Err>) {
    {
      let mut state = self.state.lock();
      if !state.subscribers.take_replay(id) {
        return;
      }
      if let Some(value) = state.retained.replay() {
        if outlet.reserve() {
          outlet.enqueue_reserved(value);
        }
      }
    }
    outlet.flush();
  }

  fn detach(&self, id: usize) {
    let removed = self.state.lock().subscribers.detach(id);
    drop(removed);
  }
}

// ============================================================================
// SubjectLink
// ============================================================================

/// Producer side of one subject attachment: replays the retained value on the
/// first demand and detaches the outlet on cancel.
struct SubjectLink<Item, Err, R> {
  core: Weak<SubjectCore<Item, Err, R>>,
  outlet: Weak<Outlet<Item, Err>>,
  id: usize,
  replay: AtomicBool,
}

impl<Item, Err, R> Producer for SubjectLink<Item, Err, R>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  R: Retain<Item> + 'static,
{
  fn on_demand(&self, _demand: Demand) {
    if !self.replay.swap(false, Ordering::AcqRel) {
      return;
    }
    let (Some(core), Some(outlet)) = (self.core.upgrade(), self.outlet.upgrade()) else {
      return;
    };
    core.replay(self.id, &outlet);
  }

  fn on_cancel(&self) {
    if let Some(core) = self.core.upgrade() {
      core.detach(self.id);
    }
  }
}
