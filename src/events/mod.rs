//! Event bus and the event vocabulary shared with presentation layers

mod bus;
mod event;

pub use bus::{EventBus, SubscriptionId};
pub use event::{Event, Secret};
