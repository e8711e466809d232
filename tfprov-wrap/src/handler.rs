//! Business logic the dispatchers wrap.
//!
//! A service package implements one of these per resource type. Handlers only ever see
//! requests that made it through the Before phase of their interceptor chain.

use tfprov_core::context::CallContext;
use tfprov_core::protocol::*;

pub const IMPORT_NOT_IMPLEMENTED: &str = "Resource Import Not Implemented";

#[async_trait::async_trait]
pub trait ResourceHandler: Send + Sync {
    fn metadata(&self, request: &MetadataRequest, response: &mut MetadataResponse);

    async fn configure(&self, _request: &ConfigureRequest, _response: &mut ConfigureResponse) {}

    async fn schema(&self, ctx: &CallContext, request: &SchemaRequest, response: &mut SchemaResponse);

    async fn create(&self, ctx: &CallContext, request: &CreateRequest, response: &mut CreateResponse);

    async fn read(&self, ctx: &CallContext, request: &ReadRequest, response: &mut ReadResponse);

    async fn update(&self, ctx: &CallContext, request: &UpdateRequest, response: &mut UpdateResponse);

    async fn delete(&self, ctx: &CallContext, request: &DeleteRequest, response: &mut DeleteResponse);

    async fn modify_plan(&self, _ctx: &CallContext, _request: &ModifyPlanRequest, _response: &mut ModifyPlanResponse) {}

    /// Whether `import_state` is the resource's own
    fn implements_import(&self) -> bool {
        false
    }

    async fn import_state(&self, ctx: &CallContext, _request: &ImportStateRequest, response: &mut ImportStateResponse) {
        response.diagnostics.add_error(
            IMPORT_NOT_IMPLEMENTED,
            format!("{} does not support import", ctx.type_name),
        );
    }
}

#[async_trait::async_trait]
pub trait DataSourceHandler: Send + Sync {
    fn metadata(&self, request: &MetadataRequest, response: &mut MetadataResponse);

    async fn configure(&self, _request: &ConfigureRequest, _response: &mut ConfigureResponse) {}

    async fn schema(&self, ctx: &CallContext, request: &SchemaRequest, response: &mut SchemaResponse);

    async fn read(&self, ctx: &CallContext, request: &ReadDataSourceRequest, response: &mut ReadDataSourceResponse);
}

#[async_trait::async_trait]
pub trait EphemeralHandler: Send + Sync {
    fn metadata(&self, request: &MetadataRequest, response: &mut MetadataResponse);

    async fn configure(&self, _request: &ConfigureRequest, _response: &mut ConfigureResponse) {}

    async fn schema(&self, ctx: &CallContext, request: &SchemaRequest, response: &mut SchemaResponse);

    async fn open(&self, ctx: &CallContext, request: &OpenEphemeralRequest, response: &mut OpenEphemeralResponse);

    async fn renew(&self, _ctx: &CallContext, _request: &RenewEphemeralRequest, _response: &mut RenewEphemeralResponse) {}

    async fn close(&self, _ctx: &CallContext, _request: &CloseEphemeralRequest, _response: &mut CloseEphemeralResponse) {}
}

#[async_trait::async_trait]
pub trait ActionHandler: Send + Sync {
    fn metadata(&self, request: &MetadataRequest, response: &mut MetadataResponse);

    async fn configure(&self, _request: &ConfigureRequest, _response: &mut ConfigureResponse) {}

    async fn schema(&self, ctx: &CallContext, request: &SchemaRequest, response: &mut SchemaResponse);

    async fn invoke(&self, ctx: &CallContext, request: &InvokeActionRequest, response: &mut InvokeActionResponse);
}

#[async_trait::async_trait]
pub trait ListResourceHandler: Send + Sync {
    fn metadata(&self, request: &MetadataRequest, response: &mut MetadataResponse);

    async fn configure(&self, _request: &ConfigureRequest, _response: &mut ConfigureResponse) {}

    async fn schema(&self, ctx: &CallContext, request: &SchemaRequest, response: &mut SchemaResponse);

    /// Lazily produced results; nothing should happen until the stream is polled
    fn list<'a>(&'a self, ctx: &'a CallContext, request: &'a ListRequest) -> ListResultsStream<'a>;
}

