pub mod error;
pub mod types;
pub mod diag;
pub mod when;
pub mod tags;
pub mod context;
pub mod client;
pub mod protocol;
pub mod names;
pub mod identity;
pub mod interceptor;

pub use client::{AwsClient, ServicePackage};
pub use context::CallContext;
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use error::{ProviderError, ProviderResult};
pub use interceptor::{Intercept, Interceptor, InterceptorInvocations, InterceptorOptions};
pub use types::{AttributePath, Identity, Object, Value};
pub use when::When;
