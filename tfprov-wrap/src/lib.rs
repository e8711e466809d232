//! Dispatchers that run each verb's interceptor chain around a resource's own handler,
//! and the provider registration that builds them.

pub mod bootstrap;
pub mod handler;
pub mod resource;
pub mod data_source;
pub mod ephemeral;
pub mod action;
pub mod list;
pub mod provider;

pub use action::WrappedAction;
pub use bootstrap::{bootstrap, CallTarget};
pub use data_source::WrappedDataSource;
pub use ephemeral::WrappedEphemeralResource;
pub use handler::{ActionHandler, DataSourceHandler, EphemeralHandler, ListResourceHandler, ResourceHandler};
pub use list::WrappedListResource;
pub use provider::{
    ActionRegistration, DataSourceRegistration, EphemeralRegistration, ListResourceRegistration, Provider, RegionSpec,
    ResourceRegistration, SchemaValidationGuard, ServicePackageDefinition,
};
pub use resource::WrappedResource;
