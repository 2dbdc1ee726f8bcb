//! Operators
//!
//! Each operator is a [`Publisher`](crate::publisher::Publisher) wrapping its
//! upstream. Subscribing it attaches a relay subscriber upstream that
//! transforms what flows through and translates demand. The methods creating
//! them live on [`PublisherExt`](crate::publisher::PublisherExt).

pub mod collect;
pub mod flat_map;
pub mod map;
pub mod prepend;
pub mod replace_empty;
pub mod replace_nil;
pub(crate) mod sink;
pub mod switch_to_latest;

pub use collect::Collect;
pub use flat_map::FlatMap;
pub use map::Map;
pub use prepend::Prepend;
pub use replace_empty::ReplaceEmpty;
pub use replace_nil::ReplaceNil;
pub use switch_to_latest::SwitchToLatest;
