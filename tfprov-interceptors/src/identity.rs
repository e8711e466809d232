use tfprov_core::context::CallContext;
use tfprov_core::identity::IdentitySpec;
use tfprov_core::interceptor::*;
use tfprov_core::protocol::*;
use tfprov_core::When;

/// Keeps a resource's identity in step with its state.
///
/// Identity is written once, after create, and filled in on read when an older state
/// never had one. Mutable identities are refreshed on every read.
pub struct IdentityInterceptor {
    spec: IdentitySpec,
}

impl IdentityInterceptor {
    pub fn new(spec: IdentitySpec) -> Self {
        Self { spec }
    }
}

#[async_trait::async_trait]
impl Intercept<CreateRequest, CreateResponse> for IdentityInterceptor {
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, CreateRequest, CreateResponse>) {
        if opts.when != When::AFTER {
            return;
        }
        let response = opts.response;
        if let (Some(state), Some(identity)) = (response.state.as_ref(), response.identity.as_mut()) {
            self.spec.populate(opts.client, ctx, state, identity);
        }
    }
}

#[async_trait::async_trait]
impl Intercept<ReadRequest, ReadResponse> for IdentityInterceptor {
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, ReadRequest, ReadResponse>) {
        if opts.when != When::AFTER {
            return;
        }
        let response = opts.response;
        let (Some(state), Some(identity)) = (response.state.as_ref(), response.identity.as_mut()) else {
            return;
        };
        if identity.is_fully_null() || self.spec.is_mutable {
            self.spec.populate(opts.client, ctx, state, identity);
        }
    }
}

impl Interceptor for IdentityInterceptor {
    fn name(&self) -> &'static str {
        "Identity"
    }

    fn resource_create(&self) -> Option<&CreateIntercept> {
        Some(self)
    }

    fn resource_read(&self) -> Option<&ReadIntercept> {
        Some(self)
    }
}
