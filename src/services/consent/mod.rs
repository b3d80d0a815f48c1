/*
 * Responsibility
 * - Consent admin request pipeline: context -> dispatch -> handler -> envelope
 * - Handler registry and the in-memory reference handler
 */
pub mod context;
pub mod dispatch;
pub mod envelope;
pub mod handler;
pub mod memory;
pub mod registry;
pub mod store;

pub use context::{ContextError, QueryParams, RequestContext};
pub use dispatch::{ConsentOperation, dispatch};
pub use envelope::EnvelopeError;
pub use handler::{ConsentAdminHandler, HandlerError, HandlerResult};
pub use memory::{InMemoryBuilder, InMemoryConsentAdminHandler};
pub use registry::{ConsentAdminBuilder, HandlerRegistry, RegistryError};
pub use store::InMemoryConsentStore;
