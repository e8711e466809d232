use std::sync::Arc;
use futures::FutureExt;
use tfprov_core::interceptor::engine::intercepted_handler;
use tfprov_core::interceptor::InterceptorInvocations;
use tfprov_core::protocol::*;
use crate::bootstrap::{CallTarget, Dispatch};
use crate::handler::DataSourceHandler;

pub struct WrappedDataSource {
    inner: Arc<dyn DataSourceHandler>,
    interceptors: InterceptorInvocations,
    dispatch: Dispatch,
}

impl WrappedDataSource {
    pub fn new(inner: Arc<dyn DataSourceHandler>, target: CallTarget, interceptors: InterceptorInvocations) -> Self {
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

    pub async fn read(&self, mut request: ReadDataSourceRequest, response: &mut ReadDataSourceResponse) {
        let Some((client, ctx)) = self.dispatch.prepare(
            "Read",
            Some(&request.config),
            request.provider_meta.as_ref(),
            &mut response.diagnostics,
        ) else {
            return;
        };
        let inner = self.inner.clone();
        intercepted_handler(
            &self.interceptors.data_source_read(),
            move |ctx, req, resp| async move { inner.read(ctx, req, resp).await }.boxed(),
            client.as_ref(),
            &ctx,
            &mut request,
            response,
        )
        .await;
    }
}
