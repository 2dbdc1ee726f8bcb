//! # rxflow: demand-driven reactive streams
//!
//! Publishers, subscribers and subscriptions with backpressure: a publisher
//! never delivers more values than its subscriber has asked for.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::{convert::Infallible, sync::Arc};
//!
//! use parking_lot::Mutex;
//! use rxflow::prelude::*;
//!
//! let subject = PassthroughSubject::<i32, Infallible>::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let out = seen.clone();
//!
//! let mut bag = Cancellables::new();
//! subject
//!   .clone()
//!   .map(|v| v * 2)
//!   .sink_value(move |v| out.lock().push(v))
//!   .store(&mut bag);
//!
//! subject.send(1);
//! subject.send(2);
//! assert_eq!(*seen.lock(), vec![2, 4]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Publisher`] | Describes a stream; `subscribe` starts one |
//! | [`Subscriber`] | Receives a subscription, values and one completion |
//! | [`Subscription`] | Requests [`Demand`] and cancels |
//! | [`PassthroughSubject`] / [`CurrentValueSubject`] | Publishers fed by `send` |
//! | [`AnyCancellable`] / [`Cancellables`] | Cancel on drop |
//!
//! Nothing in the crate installs a `tracing` subscriber; protocol events are
//! emitted at `trace`/`debug` level for applications that do.
//!
//! [`Publisher`]: publisher::Publisher
//! [`Subscriber`]: subscriber::Subscriber
//! [`Subscription`]: subscription::Subscription
//! [`Demand`]: demand::Demand
//! [`PassthroughSubject`]: subject::PassthroughSubject
//! [`CurrentValueSubject`]: subject::CurrentValueSubject
//! [`AnyCancellable`]: subscription::AnyCancellable
//! [`Cancellables`]: subscription::Cancellables

pub mod demand;
pub mod error;
pub mod ops;
pub mod prelude;
pub mod publisher;
pub mod subject;
pub mod subscriber;
pub mod subscription;

#[cfg(test)]
mod test_util;

pub use prelude::*;

#[cfg(doctest)]
mod readme {
  #![doc = include_str!("../README.md")]
}
