use std::{convert::Infallible, marker::PhantomData};

use crate::{
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::outlet::Outlet,
};

/// Creates a publisher that finishes immediately without emitting.
///
/// No demand is needed for the completion.
pub fn empty<Item>() -> Empty<Item> { Empty::new() }

/// Creates a publisher that fails immediately with `err`.
pub fn fail<Item, Err>(err: Err) -> Fail<Item, Err> { Fail(err, PhantomData) }

pub struct Empty<Item, Err = Infallible>(PhantomData<fn() -> (Item, Err)>);

impl<Item, Err> Empty<Item, Err> {
  pub fn new() -> Self { Empty(PhantomData) }
}

impl<Item, Err> Default for Empty<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> Clone for Empty<Item, Err> {
  fn clone(&self) -> Self { Self::new() }
}

impl<Item, Err> Publisher for Empty<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Item, Err> + Send + 'static,
  {
    terminate(subscriber, Completion::Finished)
  }
}

pub struct Fail<Item, Err>(Err, PhantomData<fn() -> Item>);

impl<Item, Err: Clone> Clone for Fail<Item, Err> {
  fn clone(&self) -> Self { Fail(self.0.clone(), PhantomData) }
}

impl<Item, Err> Publisher for Fail<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Item, Err> + Send + 'static,
  {
    terminate(subscriber, Completion::Failed(self.0))
  }
}

fn terminate<Item, Err, S>(subscriber: S, completion: Completion<Err>)
where
  Item: Send + 'static,
  Err: Send + 'static,
  S: Subscriber<Item, Err> + Send + 'static,
{
  let outlet = Outlet::new(Box::new(subscriber));
  outlet.complete(completion);
  outlet.start();
}
