use std::sync::Arc;
use futures::FutureExt;
use tfprov_core::identity::{IdentitySpec, ImportSpec};
use tfprov_core::interceptor::engine::intercepted_handler;
use tfprov_core::interceptor::InterceptorInvocations;
use tfprov_core::protocol::*;
use tfprov_interceptors::importer;
use crate::bootstrap::{CallTarget, Dispatch};
use crate::handler::{ResourceHandler, IMPORT_NOT_IMPLEMENTED};

/// A managed resource: every lifecycle verb runs its interceptor chain around the inner handler
pub struct WrappedResource {
    inner: Arc<dyn ResourceHandler>,
    interceptors: InterceptorInvocations,
    dispatch: Dispatch,
    identity: Arc<IdentitySpec>,
    import: Arc<ImportSpec>,
}

impl WrappedResource {
    pub fn new(
        inner: Arc<dyn ResourceHandler>,
        target: CallTarget,
        interceptors: InterceptorInvocations,
        identity: IdentitySpec,
        import: ImportSpec,
    ) -> Self {
        Self {
            inner,
            interceptors,
            dispatch: Dispatch::new(target),
            identity: Arc::new(identity),
            import: Arc::new(import),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.dispatch.target.type_name
    }

    pub fn interceptors(&self) -> &InterceptorInvocations {
        &self.interceptors
    }

    pub fn metadata(&self, request: &MetadataRequest, response: &mut MetadataResponse) {
        self.inner.metadata(request, response);
    }

    pub async fn configure(&self, request: ConfigureRequest, response: &mut ConfigureResponse) {
        if let Some(client) = &request.client {
            self.dispatch.client.set(client.clone());
        }
        self.inner.configure(&request, response).await;
    }

    pub async fn schema(&self, mut request: SchemaRequest, response: &mut SchemaResponse) {
        let (client, ctx) = self.dispatch.prepare_schema();
        let inner = self.inner.clone();
        intercepted_handler(
            &self.interceptors.schema(),
            move |ctx, req, resp| async move { inner.schema(ctx, req, resp).await }.boxed(),
            client.as_ref(),
            &ctx,
            &mut request,
            response,
        )
        .await;
    }

    pub async fn create(&self, mut request: CreateRequest, response: &mut CreateResponse) {
        let Some((client, ctx)) = self.dispatch.prepare(
            "Create",
            Some(&request.plan),
            request.provider_meta.as_ref(),
            &mut response.diagnostics,
        ) else {
            return;
        };
        let inner = self.inner.clone();
        intercepted_handler(
            &self.interceptors.resource_create(),
            move |ctx, req, resp| async move { inner.create(ctx, req, resp).await }.boxed(),
            client.as_ref(),
            &ctx,
            &mut request,
            response,
        )
        .await;
    }

    pub async fn read(&self, mut request: ReadRequest, response: &mut ReadResponse) {
        let Some((client, ctx)) = self.dispatch.prepare(
            "Read",
            request.state.as_ref(),
            request.provider_meta.as_ref(),
            &mut response.diagnostics,
        ) else {
            return;
        };
        let inner = self.inner.clone();
        intercepted_handler(
            &self.interceptors.resource_read(),
            move |ctx, req, resp| async move { inner.read(ctx, req, resp).await }.boxed(),
            client.as_ref(),
            &ctx,
            &mut request,
            response,
        )
        .await;
    }

    pub async fn update(&self, mut request: UpdateRequest, response: &mut UpdateResponse) {
        let Some((client, ctx)) = self.dispatch.prepare(
            "Update",
            Some(&request.plan),
            request.provider_meta.as_ref(),
            &mut response.diagnostics,
        ) else {
            return;
        };
        let inner = self.inner.clone();
        intercepted_handler(
            &self.interceptors.resource_update(),
            move |ctx, req, resp| async move { inner.update(ctx, req, resp).await }.boxed(),
            client.as_ref(),
            &ctx,
            &mut request,
            response,
        )
        .await;
    }

    pub async fn delete(&self, mut request: DeleteRequest, response: &mut DeleteResponse) {
        let Some((client, ctx)) = self.dispatch.prepare(
            "Delete",
            Some(&request.state),
            request.provider_meta.as_ref(),
            &mut response.diagnostics,
        ) else {
            return;
        };
        let inner = self.inner.clone();
        intercepted_handler(
            &self.interceptors.resource_delete(),
            move |ctx, req, resp| async move { inner.delete(ctx, req, resp).await }.boxed(),
            client.as_ref(),
            &ctx,
            &mut request,
            response,
        )
        .await;
    }

    pub async fn modify_plan(&self, mut request: ModifyPlanRequest, response: &mut ModifyPlanResponse) {
        let Some((client, ctx)) = self.dispatch.prepare(
            "ModifyPlan",
            request.config.as_ref(),
            request.provider_meta.as_ref(),
            &mut response.diagnostics,
        ) else {
            return;
        };
        let inner = self.inner.clone();
        intercepted_handler(
            &self.interceptors.resource_modify_plan(),
            move |ctx, req, resp| async move { inner.modify_plan(ctx, req, resp).await }.boxed(),
            client.as_ref(),
            &ctx,
            &mut request,
            response,
        )
        .await;
    }

    /// Whether ImportState has anything to run
    pub fn supports_import(&self) -> bool {
        self.import.wrapped_import || self.inner.implements_import()
    }

    /// Generic resolution for wrapped imports, followed by the resource's own import when it
    /// asks for one; otherwise the resource's own import alone.
    pub async fn import_state(&self, mut request: ImportStateRequest, response: &mut ImportStateResponse) {
        if !self.supports_import() {
            response.diagnostics.add_error(
                IMPORT_NOT_IMPLEMENTED,
                format!("{} does not support import", self.type_name()),
            );
            return;
        }
        let Some((client, ctx)) = self.dispatch.prepare("ImportState", None, None, &mut response.diagnostics) else {
            return;
        };
        let interceptors = self.interceptors.resource_import_state();
        let inner = self.inner.clone();

        if !self.import.wrapped_import {
            intercepted_handler(
                &interceptors,
                move |ctx, req, resp| async move { inner.import_state(ctx, req, resp).await }.boxed(),
                client.as_ref(),
                &ctx,
                &mut request,
                response,
            )
            .await;
            return;
        }

        let resolver_client = client.clone();
        let identity = self.identity.clone();
        let import = self.import.clone();
        intercepted_handler(
            &interceptors,
            move |ctx, req, resp| {
                async move {
                    importer::import_state(resolver_client.as_ref(), ctx, &identity, &import, req, resp);
                    if import.custom_import && !resp.diagnostics.has_error() {
                        inner.import_state(ctx, req, resp).await;
                    }
                }
                .boxed()
            },
            client.as_ref(),
            &ctx,
            &mut request,
            response,
        )
        .await;
    }
}
