//! Serialized, demand-accounted delivery to one subscriber.
//!
//! Every subscription created by this crate is backed by an [`Outlet`]. It
//! owns the downstream subscriber, a queue of pending signals and the demand
//! counters. The state lock is never held while a subscriber callback runs:
//! whichever thread finds the outlet idle becomes the drainer and delivers
//! queued signals one at a time, while every other caller (including
//! re-entrant calls from inside the callbacks) only enqueues and returns.

use std::{collections::VecDeque, sync::Arc};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};

use super::{Subscription, SubscriptionRef};
use crate::{
  demand::Demand,
  subscriber::{BoxedSubscriber, Completion},
};

/// The producing side behind an outlet.
///
/// `on_demand` is called, outside every lock, with each increment of
/// downstream demand (explicit requests as well as replies from `receive`).
/// `on_cancel` is called once when the downstream cancels.
pub(crate) trait Producer: Send + Sync {
  fn on_demand(&self, demand: Demand);
  fn on_cancel(&self);
}

enum Signal<Item, Err> {
  Subscription(SubscriptionRef),
  Value(Item),
  Completion(Completion<Err>),
}

struct OutletState<Item, Err> {
  subscriber: Option<BoxedSubscriber<Item, Err>>,
  producer: Option<Arc<dyn Producer>>,
  queue: VecDeque<Signal<Item, Err>>,
  demand: Demand,
  // queued values already paid for out of `demand`
  reserved: usize,
  started: bool,
  draining: bool,
  // a completion is queued; no more values are accepted
  completed: bool,
  // cancelled, or the completion was delivered
  closed: bool,
}

pub(crate) struct Outlet<Item, Err> {
  state: Mutex<OutletState<Item, Err>>,
}

impl<Item, Err> Outlet<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  pub(crate) fn new(subscriber: BoxedSubscriber<Item, Err>) -> Arc<Self> {
    Arc::new(Outlet {
      state: Mutex::new(OutletState {
        subscriber: Some(subscriber),
        producer: None,
        queue: VecDeque::new(),
        demand: Demand::none(),
        reserved: 0,
        started: false,
        draining: false,
        completed: false,
        closed: false,
      }),
    })
  }

  pub(crate) fn set_producer(&self, producer: Arc<dyn Producer>) {
    let mut state = self.state.lock();
    if !state.closed {
      state.producer = Some(producer);
    }
  }

  /// Hands the subscription to the subscriber. Signals queued before this
  /// call are held back until the subscription has been delivered.
  pub(crate) fn start(self: &Arc<Self>) {
    let mut state = self.state.lock();
    if state.started || state.closed {
      return;
    }
    state.started = true;
    let subscription: SubscriptionRef = self.clone();
    state.queue.push_front(Signal::Subscription(subscription));
    trace!("subscription started");
    self.drain(state);
  }

  /// Delivers `value` only if demand is available right now; otherwise the
  /// value is dropped and `false` is returned.
  pub(crate) fn offer(&self, value: Item) -> bool {
    let mut state = self.state.lock();
    if state.closed || state.completed || !state.demand.take_one() {
      return false;
    }
    state.reserved += 1;
    state.queue.push_back(Signal::Value(value));
    self.drain(state);
    true
  }

  /// Queues `value`; it is delivered as soon as demand allows.
  pub(crate) fn push(&self, value: Item) {
    let mut state = self.state.lock();
    if state.closed || state.completed {
      return;
    }
    state.queue.push_back(Signal::Value(value));
    self.drain(state);
  }

  /// Claims one unit of demand for a value produced afterwards with
  /// [`push_reserved`](Self::push_reserved).
  pub(crate) fn reserve(&self) -> bool {
    let mut state = self.state.lock();
    if state.closed || state.completed || !state.demand.take_one() {
      return false;
    }
    state.reserved += 1;
    true
  }

  pub(crate) fn push_reserved(&self, value: Item) {
    let mut state = self.state.lock();
    if state.closed || state.completed {
      return;
    }
    state.queue.push_back(Signal::Value(value));
    self.drain(state);
  }

  /// Queues a value paid for by [`reserve`](Self::reserve) without delivering
  /// it. Callers holding a lock of their own use this and call
  /// [`flush`](Self::flush) once that lock is released.
  pub(crate) fn enqueue_reserved(&self, value: Item) {
    let mut state = self.state.lock();
    if state.closed || state.completed {
      return;
    }
    state.queue.push_back(Signal::Value(value));
  }

  pub(crate) fn flush(&self) {
    let state = self.state.lock();
    self.drain(state);
  }

  /// Queues the terminal event. `Finished` waits behind queued values, a
  /// failure discards them and is delivered right away.
  pub(crate) fn complete(&self, completion: Completion<Err>) {
    let mut state = self.state.lock();
    if state.closed || state.completed {
      return;
    }
    state.completed = true;
    if completion.is_failed() {
      state
        .queue
        .retain(|signal| matches!(signal, Signal::Subscription(_)));
      state.reserved = 0;
    }
    state.queue.push_back(Signal::Completion(completion));
    self.drain(state);
  }

  /// `true` once the outlet will accept nothing more.
  pub(crate) fn is_terminated(&self) -> bool {
    let state = self.state.lock();
    state.closed || state.completed
  }

  pub(crate) fn demand(&self) -> Demand { self.state.lock().demand }

  fn drain(&self, mut state: MutexGuard<'_, OutletState<Item, Err>>) {
    if state.draining || !state.started {
      return;
    }
    let Some(mut subscriber) = state.subscriber.take() else {
      return;
    };
    state.draining = true;
    let mut granted = Demand::none();

    while !state.closed {
      let deliverable = match state.queue.front() {
        None => false,
        Some(Signal::Value(_)) => {
          if state.reserved > 0 {
            state.reserved -= 1;
            true
          } else {
            state.demand.take_one()
          }
        }
        Some(_) => true,
      };
      if !deliverable {
        break;
      }
      let Some(signal) = state.queue.pop_front() else {
        break;
      };
      match signal {
        Signal::Subscription(subscription) => {
          MutexGuard::unlocked(&mut state, || subscriber.receive_subscription(subscription));
        }
        Signal::Value(value) => {
          let more = MutexGuard::unlocked(&mut state, || subscriber.receive(value));
          if !state.closed && more.is_positive() {
            state.demand += more;
            granted += more;
          }
        }
        Signal::Completion(completion) => {
          state.closed = true;
          trace!(finished = completion.is_finished(), "delivering completion");
          MutexGuard::unlocked(&mut state, || subscriber.receive_completion(completion));
        }
      }
    }

    state.draining = false;
    let mut retired = None;
    let mut notify = None;
    if state.closed {
      state.queue.clear();
      state.reserved = 0;
      retired = Some((subscriber, state.producer.take()));
    } else {
      state.subscriber = Some(subscriber);
      if granted.is_positive() && !state.completed {
        notify = state.producer.clone();
      }
    }
    drop(state);
    drop(retired);
    if let Some(producer) = notify {
      producer.on_demand(granted);
    }
  }
}

impl<Item, Err> Subscription for Outlet<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn request(&self, demand: Demand) {
    if demand.is_zero() {
      return;
    }
    let mut state = self.state.lock();
    if state.closed {
      return;
    }
    state.demand += demand;
    let producer = if state.completed { None } else { state.producer.clone() };
    self.drain(state);
    if let Some(producer) = producer {
      producer.on_demand(demand);
    }
  }

  fn cancel(&self) {
    let mut state = self.state.lock();
    if state.closed {
      return;
    }
    state.closed = true;
    state.queue.clear();
    state.reserved = 0;
    state.demand = Demand::none();
    let subscriber = state.subscriber.take();
    let producer = state.producer.take();
    drop(state);
    debug!("subscription cancelled");
    drop(subscriber);
    if let Some(producer) = producer {
      producer.on_cancel();
    }
  }
}
