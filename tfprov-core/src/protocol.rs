//! Request/response pairs for every verb the pipeline wraps.
//!
//! Requests are what the host sends; responses are pre-populated by the host (a modify-plan
//! response starts with the proposed plan, an import response with an empty state) and then
//! mutated by interceptors and the inner handler.

use std::sync::Arc;
use futures::stream::BoxStream;
use crate::client::AwsClient;
use crate::diag::Diagnostics;
use crate::types::{AttributePath, Identity, Object, Schema};

/// Anything that carries diagnostics back to the host
pub trait Response {
    fn diagnostics(&self) -> &Diagnostics;
    fn diagnostics_mut(&mut self) -> &mut Diagnostics;

    fn has_error(&self) -> bool {
        self.diagnostics().has_error()
    }
}

macro_rules! impl_response {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Response for $ty {
                fn diagnostics(&self) -> &Diagnostics {
                    &self.diagnostics
                }
                fn diagnostics_mut(&mut self) -> &mut Diagnostics {
                    &mut self.diagnostics
                }
            }
        )+
    };
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRequest {
    pub provider_type_name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataResponse {
    pub type_name: String,
}

#[derive(Clone, Default)]
pub struct ConfigureRequest {
    pub client: Option<Arc<dyn AwsClient>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigureResponse {
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRequest;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaResponse {
    pub schema: Schema,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateRequest {
    pub config: Object,
    pub plan: Object,
    pub provider_meta: Option<Object>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateResponse {
    pub state: Option<Object>,
    /// `None` when the resource has no identity
    pub identity: Option<Identity>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadRequest {
    pub state: Option<Object>,
    pub identity: Option<Identity>,
    pub provider_meta: Option<Object>,
}

/// `state: None` after a read means the resource is gone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadResponse {
    pub state: Option<Object>,
    pub identity: Option<Identity>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRequest {
    pub config: Object,
    pub plan: Object,
    pub state: Object,
    pub identity: Option<Identity>,
    pub provider_meta: Option<Object>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResponse {
    pub state: Option<Object>,
    pub identity: Option<Identity>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteRequest {
    pub state: Object,
    pub identity: Option<Identity>,
    pub provider_meta: Option<Object>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteResponse {
    pub diagnostics: Diagnostics,
}

/// `plan: None` is a destroy plan, `state: None` a create
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifyPlanRequest {
    pub config: Option<Object>,
    pub plan: Option<Object>,
    pub state: Option<Object>,
    pub provider_meta: Option<Object>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifyPlanResponse {
    pub plan: Option<Object>,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Diagnostics,
}

impl ModifyPlanResponse {
    /// Response pre-populated with the proposed plan
    pub fn for_request(request: &ModifyPlanRequest) -> Self {
        Self {
            plan: request.plan.clone(),
            ..Default::default()
        }
    }
}

/// Either a legacy `id` or an `identity` is set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportStateRequest {
    pub id: String,
    pub identity: Option<Identity>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportStateResponse {
    pub state: Object,
    pub identity: Option<Identity>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadDataSourceRequest {
    pub config: Object,
    pub provider_meta: Option<Object>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadDataSourceResponse {
    pub state: Option<Object>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenEphemeralRequest {
    pub config: Object,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenEphemeralResponse {
    pub result: Option<Object>,
    /// Opaque data handed back on renew and close
    pub private: Option<Object>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenewEphemeralRequest {
    pub private: Option<Object>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenewEphemeralResponse {
    pub private: Option<Object>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloseEphemeralRequest {
    pub private: Option<Object>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloseEphemeralResponse {
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvokeActionRequest {
    pub config: Object,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvokeActionResponse {
    pub progress: Vec<String>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListRequest {
    pub config: Object,
    pub include_resource: bool,
    pub limit: i64,
}

/// One element of a list stream: a found resource, or interceptor diagnostics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListResult {
    pub identity: Option<Identity>,
    pub resource: Option<Object>,
    pub display_name: String,
    pub diagnostics: Diagnostics,
}

impl ListResult {
    pub fn from_diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            ..Default::default()
        }
    }
}

/// Lazy, forward-only sequence of list results
pub type ListResultsStream<'a> = BoxStream<'a, ListResult>;

impl_response!(
    ConfigureResponse,
    SchemaResponse,
    CreateResponse,
    ReadResponse,
    UpdateResponse,
    DeleteResponse,
    ModifyPlanResponse,
    ImportStateResponse,
    ReadDataSourceResponse,
    OpenEphemeralResponse,
    RenewEphemeralResponse,
    CloseEphemeralResponse,
    InvokeActionResponse,
    ListResult,
);
