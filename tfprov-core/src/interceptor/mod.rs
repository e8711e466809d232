use std::sync::Arc;
use crate::client::AwsClient;
use crate::context::CallContext;
use crate::diag::Diagnostics;
use crate::protocol::*;
use crate::when::When;

pub mod engine;

/// Non-owning view handed to an interceptor for one phase of one call.
///
/// The request is mutable only so that Before-phase interceptors can canonicalize it
/// (an import ID losing its `@region` suffix); nothing else should write to it.
pub struct InterceptorOptions<'a, Req, Resp> {
    pub client: &'a dyn AwsClient,
    pub request: &'a mut Req,
    pub response: &'a mut Resp,
    pub when: When,
}

/// One interceptor capability: participation in the verb identified by `Req`/`Resp`.
///
/// An implementation is called for every phase of its verb; phases it does not care
/// about are no-ops.
#[async_trait::async_trait]
pub trait Intercept<Req, Resp>: Send + Sync
where
    Req: Send + Sync,
    Resp: Send,
{
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, Req, Resp>);
}

/// List interceptors cannot write into a response: the results are a stream.
/// They return their diagnostics and the executor splices them into the stream.
pub struct ListInterceptorOptions<'a> {
    pub client: &'a dyn AwsClient,
    pub request: &'a ListRequest,
    pub when: When,
}

#[async_trait::async_trait]
pub trait ListIntercept: Send + Sync {
    async fn intercept(&self, ctx: &CallContext, opts: ListInterceptorOptions<'_>) -> Diagnostics;
}

pub type SchemaIntercept = dyn Intercept<SchemaRequest, SchemaResponse>;
pub type CreateIntercept = dyn Intercept<CreateRequest, CreateResponse>;
pub type ReadIntercept = dyn Intercept<ReadRequest, ReadResponse>;
pub type UpdateIntercept = dyn Intercept<UpdateRequest, UpdateResponse>;
pub type DeleteIntercept = dyn Intercept<DeleteRequest, DeleteResponse>;
pub type ModifyPlanIntercept = dyn Intercept<ModifyPlanRequest, ModifyPlanResponse>;
pub type ImportStateIntercept = dyn Intercept<ImportStateRequest, ImportStateResponse>;
pub type DataSourceReadIntercept = dyn Intercept<ReadDataSourceRequest, ReadDataSourceResponse>;
pub type EphemeralOpenIntercept = dyn Intercept<OpenEphemeralRequest, OpenEphemeralResponse>;
pub type EphemeralRenewIntercept = dyn Intercept<RenewEphemeralRequest, RenewEphemeralResponse>;
pub type EphemeralCloseIntercept = dyn Intercept<CloseEphemeralRequest, CloseEphemeralResponse>;
pub type ActionInvokeIntercept = dyn Intercept<InvokeActionRequest, InvokeActionResponse>;

/// A registered interceptor and the capabilities it implements.
///
/// Every accessor defaults to `None`; an interceptor opts into a verb by returning `Some(self)`.
pub trait Interceptor: Send + Sync {
    fn name(&self) -> &'static str;

    fn schema(&self) -> Option<&SchemaIntercept> {
        None
    }

    fn resource_create(&self) -> Option<&CreateIntercept> {
        None
    }

    fn resource_read(&self) -> Option<&ReadIntercept> {
        None
    }

    fn resource_update(&self) -> Option<&UpdateIntercept> {
        None
    }

    fn resource_delete(&self) -> Option<&DeleteIntercept> {
        None
    }

    fn resource_modify_plan(&self) -> Option<&ModifyPlanIntercept> {
        None
    }

    fn resource_import_state(&self) -> Option<&ImportStateIntercept> {
        None
    }

    fn data_source_read(&self) -> Option<&DataSourceReadIntercept> {
        None
    }

    fn ephemeral_open(&self) -> Option<&EphemeralOpenIntercept> {
        None
    }

    fn ephemeral_renew(&self) -> Option<&EphemeralRenewIntercept> {
        None
    }

    fn ephemeral_close(&self) -> Option<&EphemeralCloseIntercept> {
        None
    }

    fn action_invoke(&self) -> Option<&ActionInvokeIntercept> {
        None
    }

    fn list(&self) -> Option<&dyn ListIntercept> {
        None
    }
}

macro_rules! capability_filter {
    ($($(#[$meta:meta])* $name:ident => $ty:ty;)+) => {
        $(
            $(#[$meta])*
            pub fn $name(&self) -> Vec<&$ty> {
                self.interceptors.iter().filter_map(|i| i.$name()).collect()
            }
        )+
    };
}

/// Ordered interceptor list of one resource type.
///
/// Insertion order is decided at registration and is the Before-phase order.
#[derive(Clone, Default)]
pub struct InterceptorInvocations {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorInvocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    capability_filter! {
        schema => SchemaIntercept;
        resource_create => CreateIntercept;
        resource_read => ReadIntercept;
        resource_update => UpdateIntercept;
        resource_delete => DeleteIntercept;
        resource_modify_plan => ModifyPlanIntercept;
        resource_import_state => ImportStateIntercept;
        data_source_read => DataSourceReadIntercept;
        ephemeral_open => EphemeralOpenIntercept;
        ephemeral_renew => EphemeralRenewIntercept;
        ephemeral_close => EphemeralCloseIntercept;
        action_invoke => ActionInvokeIntercept;
        list => dyn ListIntercept;
    }
}

impl FromIterator<Arc<dyn Interceptor>> for InterceptorInvocations {
    fn from_iter<T: IntoIterator<Item = Arc<dyn Interceptor>>>(iter: T) -> Self {
        Self { interceptors: iter.into_iter().collect() }
    }
}
