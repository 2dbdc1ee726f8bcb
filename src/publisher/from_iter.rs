use std::{
  convert::Infallible,
  iter::Peekable,
  sync::{Arc, Weak},
};

use parking_lot::Mutex;

use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::outlet::{Outlet, Producer},
};

/// Creates a publisher that emits the values of an iterator, then finishes.
///
/// Values are pulled lazily, one per unit of demand, with a lookahead of one
/// element: the iterator is probed at subscribe time and after every emitted
/// value, so exhaustion is signalled right after the last value instead of
/// waiting for further demand. An empty iterator finishes without waiting for
/// demand.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use parking_lot::Mutex;
/// use rxflow::prelude::*;
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let out = seen.clone();
/// let _handle = publisher::from_iter(vec![0, 1, 2]).sink_value(move |v| out.lock().push(v));
/// assert_eq!(*seen.lock(), vec![0, 1, 2]);
/// ```
pub fn from_iter<Iter>(iter: Iter) -> FromIter<Iter>
where
  Iter: IntoIterator,
{
  FromIter(iter)
}

#[derive(Debug, Clone)]
pub struct FromIter<Iter>(Iter);

impl<Iter> Publisher for FromIter<Iter>
where
  Iter: IntoIterator,
  Iter::IntoIter: Send + 'static,
  Iter::Item: Send + 'static,
{
  type Item = Iter::Item;
  type Err = Infallible;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Iter::Item, Infallible> + Send + 'static,
  {
    let outlet = Outlet::new(Box::new(subscriber));
    let mut iter = self.0.into_iter().peekable();
    if iter.peek().is_none() {
      outlet.complete(Completion::Finished);
    } else {
      outlet.set_producer(Arc::new(IterProducer {
        state: Mutex::new(IterState { iter: Some(iter), producing: false, missed: false }),
        outlet: Arc::downgrade(&outlet),
      }));
    }
    outlet.start();
  }
}

struct IterState<I: Iterator> {
  iter: Option<Peekable<I>>,
  producing: bool,
  missed: bool,
}

struct IterProducer<I: Iterator> {
  state: Mutex<IterState<I>>,
  outlet: Weak<Outlet<I::Item, Infallible>>,
}

impl<I> IterProducer<I>
where
  I: Iterator + Send + 'static,
  I::Item: Send + 'static,
{
  // Emits while the outlet has demand. Demand arriving from another thread
  // (or re-entrantly) while a loop is running is picked up through `missed`.
  fn produce(&self, outlet: &Outlet<I::Item, Infallible>) {
    {
      let mut state = self.state.lock();
      if state.producing {
        state.missed = true;
        return;
      }
      state.producing = true;
    }
    loop {
      while outlet.reserve() {
        let (next, exhausted) = {
          let mut state = self.state.lock();
          let Some(iter) = state.iter.as_mut() else {
            break;
          };
          let next = iter.next();
          let exhausted = iter.peek().is_none();
          if exhausted {
            state.iter = None;
          }
          (next, exhausted)
        };
        if let Some(value) = next {
          outlet.push_reserved(value);
        }
        if exhausted {
          outlet.complete(Completion::Finished);
          break;
        }
      }
      let mut state = self.state.lock();
      if state.missed && state.iter.is_some() {
        state.missed = false;
        continue;
      }
      state.missed = false;
      state.producing = false;
      return;
    }
  }
}

impl<I> Producer for IterProducer<I>
where
  I: Iterator + Send + 'static,
  I::Item: Send + 'static,
{
  fn on_demand(&self, _demand: Demand) {
    if let Some(outlet) = self.outlet.upgrade() {
      self.produce(&outlet);
    }
  }

  fn on_cancel(&self) { self.state.lock().iter = None; }
}
