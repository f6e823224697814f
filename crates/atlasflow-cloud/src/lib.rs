//! AtlasFlow Cloud Infrastructure
//!
//! Provider-agnostic building blocks for mapping declarative resource
//! definitions onto a remote service's REST API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  atlasflow CLI                   │
//! │        (create / read / update / delete)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                atlasflow-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait CloudProvider / ResourceHandler   │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐   │
//! │  │ id codec   │ │ reconcile  │ │ state wait │   │
//! │  └────────────┘ └────────────┘ └────────────┘   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │        State Mgmt (.atlasflow/)           │   │
//! │  └──────────────────────────────────────────┘   │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼────────┐
//!           │ mongodb atlas  │
//!           │    provider    │
//!           └────────────────┘
//! ```
//!
//! Every operation follows the same cycle: decode the plan/state record,
//! make exactly one remote call (status polling aside), then reconcile the
//! response into the record without losing write-only values.

pub mod error;
pub mod id;
pub mod provider;
pub mod reconcile;
pub mod resource;
pub mod state;
pub mod wait;

// Re-exports
pub use error::{CloudError, Result};
pub use id::{StateId, decode_state_id, encode_state_id, split_import_id};
pub use provider::{
    AuthStatus, CloudProvider, ResourceConfig, ResourceSet, address, parse_address,
};
pub use resource::{
    DataSource, DataSourceHandler, Resource, ResourceHandler, decode_record, encode_record,
    record_id,
};
pub use state::{GlobalState, Operation, ResourceState, StateLock, StateManager};
pub use wait::{PollTiming, Refresh, StateChangeConf, WaitOutcome};
