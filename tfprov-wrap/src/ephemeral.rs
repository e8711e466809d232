//! Ephemeral resource dispatch. Open, Renew and Close each run their own interceptor chain.

use std::sync::Arc;
use futures::FutureExt;
use tfprov_core::interceptor::engine::intercepted_handler;
use tfprov_core::interceptor::InterceptorInvocations;
use tfprov_core::protocol::*;
use crate::bootstrap::{CallTarget, Dispatch};
use crate::handler::EphemeralHandler;

/// An ephemeral resource. Renew and Close carry only private data, so they have no region to read.
pub struct WrappedEphemeralResource {
    inner: Arc<dyn EphemeralHandler>,
    interceptors: InterceptorInvocations,
    dispatch: Dispatch,
}

impl WrappedEphemeralResource {
    pub fn new(inner: Arc<dyn EphemeralHandler>, target: CallTarget, interceptors: InterceptorInvocations) -> Self {
        Self {
            inner,
            interceptors,
            dispatch: Dispatch::new(target),
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

    pub async fn open(&self, mut request: OpenEphemeralRequest, response: &mut OpenEphemeralResponse) {
        let Some((client, ctx)) = self.dispatch.prepare("Open", Some(&request.config), None, &mut response.diagnostics) else {
            return;
        };
        let inner = self.inner.clone();
        intercepted_handler(
            &self.interceptors.ephemeral_open(),
            move |ctx, req, resp| async move { inner.open(ctx, req, resp).await }.boxed(),
            client.as_ref(),
            &ctx,
            &mut request,
            response,
        )
        .await;
    }

    pub async fn renew(&self, mut request: RenewEphemeralRequest, response: &mut RenewEphemeralResponse) {
        let Some((client, ctx)) = self.dispatch.prepare("Renew", None, None, &mut response.diagnostics) else {
            return;
        };
        let inner = self.inner.clone();
        intercepted_handler(
            &self.interceptors.ephemeral_renew(),
            move |ctx, req, resp| async move { inner.renew(ctx, req, resp).await }.boxed(),
            client.as_ref(),
            &ctx,
            &mut request,
            response,
        )
        .await;
    }

    pub async fn close(&self, mut request: CloseEphemeralRequest, response: &mut CloseEphemeralResponse) {
        let Some((client, ctx)) = self.dispatch.prepare("Close", None, None, &mut response.diagnostics) else {
            return;
        };
        let inner = self.inner.clone();
        intercepted_handler(
            &self.interceptors.ephemeral_close(),
            move |ctx, req, resp| async move { inner.close(ctx, req, resp).await }.boxed(),
            client.as_ref(),
            &ctx,
            &mut request,
            response,
        )
        .await;
    }
}
