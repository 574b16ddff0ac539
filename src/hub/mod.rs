//! Single-writer hub actors.
//!
//! Each named actor owns one [`KvStore`](crate::store::KvStore) holding the
//! link list, admin sessions, rate windows and conversation logs. All state
//! access goes through the actor's command channel, so every
//! read-modify-write is linearized without locks. The HTTP surface uses one
//! actor, [`HUB_ACTOR_NAME`].

mod actor;
mod actor_types;
mod handle;
mod registry;

pub use actor::HubActor;
pub use actor_types::{ActorError, CHANNEL_CAPACITY, HUB_ACTOR_NAME, HubCommand};
pub use handle::HubHandle;
pub use registry::{ActorRegistry, StoreFactory};
