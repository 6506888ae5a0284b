//! # Capability Dispatcher
//!
//! Discovers pluggable capability modules and relays messages between the
//! core and external collaborating agents on a fixed polling cycle.

pub mod dispatcher;
pub mod modules;
pub mod telemetry;
pub mod transport;

pub use dispatcher::{Dispatcher, FnHandler, MessageHandler, PumpHandle, PumpReport, handler_fn};
pub use modules::{
    CapabilityModule, HostContext, LoadedModule, ModuleCatalog, ModuleDescriptor, PassiveModule
};
pub use transport::InMemoryTransport;
