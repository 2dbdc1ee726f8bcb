use std::{
  convert::Infallible,
  sync::{Arc, Weak},
};

use parking_lot::Mutex;

use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::outlet::{Outlet, Producer},
};

/// Creates a publisher that emits `value` once and then finishes.
///
/// The value is held back until the subscriber requests demand.
///
/// # Examples
///
/// ```
/// use rxflow::prelude::*;
///
/// let _handle = publisher::just(5).sink_value(|v| assert_eq!(v, 5));
/// ```
pub fn just<Item>(value: Item) -> Just<Item> { Just(value) }

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Just<Item>(Item);

impl<Item: Send + 'static> Publisher for Just<Item> {
  type Item = Item;
  type Err = Infallible;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Item, Infallible> + Send + 'static,
  {
    let outlet = Outlet::new(Box::new(subscriber));
    outlet.set_producer(Arc::new(JustProducer {
      value: Mutex::new(Some(self.0)),
      outlet: Arc::downgrade(&outlet),
    }));
    outlet.start();
  }
}

struct JustProducer<Item> {
  value: Mutex<Option<Item>>,
  outlet: Weak<Outlet<Item, Infallible>>,
}

impl<Item: Send + 'static> Producer for JustProducer<Item> {
  fn on_demand(&self, _demand: Demand) {
    let Some(outlet) = self.outlet.upgrade() else {
      return;
    };
    let value = {
      let mut slot = self.value.lock();
      if slot.is_none() || !outlet.reserve() {
        return;
      }
      slot.take()
    };
    if let Some(value) = value {
      outlet.push_reserved(value);
      outlet.complete(Completion::Finished);
    }
  }

  fn on_cancel(&self) { self.value.lock().take(); }
}
