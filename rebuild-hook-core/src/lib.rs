#![doc = "rebuild-hook-core: core logic library for rebuild-hook."]

//! Content events come in, build-hook calls go out.
//!
//! - [`event`]: the five content lifecycle events and their notifications
//! - [`config`]: build-hook configuration and request resolution
//! - [`contract`]: request/outcome types and the mockable traits
//! - [`transport`]: reqwest implementation of the transport
//! - [`rebuilder`]: the handler that calls the hook
//! - [`dispatch`]: event bus and background dispatcher

pub mod config;
pub mod contract;
pub mod dispatch;
pub mod event;
pub mod rebuilder;
pub mod transport;

pub use config::{BuildHookConfig, MethodSelection, RetryPolicy, SkipReason};
pub use contract::{HookMethod, HookRequest, HookResponse, TriggerError, TriggerOutcome};
pub use dispatch::{DispatchReport, Dispatcher, EventBus};
pub use event::{ContentEvent, ContentNotification};
pub use rebuilder::WebsiteRebuilder;
