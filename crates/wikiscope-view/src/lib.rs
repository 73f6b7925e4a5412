//! wikiscope view: graph view lifecycle, handler bridge, snapshot queue
//! and feed

pub mod bridge;
pub mod config;
pub mod error;
pub mod feed;
pub mod memory;
pub mod queue;
pub mod view;


pub use bridge::{attach, Subscription, SubscriptionBridge};
pub use config::ViewConfig;
pub use error::{ConfigError, ViewError};
pub use feed::{channel, FeedHandle, FeedStats, SnapshotFeed};
pub use memory::{MemorySurface, SurfaceCommand};
pub use queue::{PendingSnapshot, QueuePolicy, SnapshotQueue};
pub use view::{Accessors, GraphView, ViewState};
