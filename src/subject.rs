//! Subjects: publishers fed imperatively
//!
//! A subject is both a [`Publisher`](crate::publisher::Publisher) and an
//! imperative sink. Everything sent to it is multicast to the subscribers
//! attached at that moment, each bounded by its own demand.
//!
//! - [`PassthroughSubject`] retains nothing.
//! - [`CurrentValueSubject`] retains the latest value and replays it to new
//!   subscribers.
//!
//! Both also implement [`Subscriber`](crate::subscriber::Subscriber), so a
//! subject can be attached to another publisher to re-broadcast it.

mod current_value_subject;
mod passthrough_subject;
mod subject_core;
mod subscribers;

pub use current_value_subject::CurrentValueSubject;
pub use passthrough_subject::PassthroughSubject;
