//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

pub use crate::{
  demand::Demand,
  error::SubjectError,
  publisher::{self, AnyPublisher, BoxPublisher, Publisher, PublisherExt},
  subject::{CurrentValueSubject, PassthroughSubject},
  subscriber::{BoxedSubscriber, Completion, Subscriber},
  subscription::{AnyCancellable, Cancellables, Subscription, SubscriptionRef},
};
