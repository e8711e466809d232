use std::sync::Arc;
use async_stream::stream;
use futures::{FutureExt, StreamExt};
use tfprov_core::diag::Diagnostics;
use tfprov_core::interceptor::engine::{intercepted_handler, intercepted_list_handler};
use tfprov_core::interceptor::InterceptorInvocations;
use tfprov_core::protocol::*;
use crate::bootstrap::{CallTarget, Dispatch};
use crate::handler::ListResourceHandler;

pub struct WrappedListResource {
    inner: Arc<dyn ListResourceHandler>,
    interceptors: InterceptorInvocations,
    dispatch: Dispatch,
}

impl WrappedListResource {
    pub fn new(inner: Arc<dyn ListResourceHandler>, target: CallTarget, interceptors: InterceptorInvocations) -> Self {
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

    /// Results of the inner list, with interceptor diagnostics spliced in.
    ///
    /// Context bootstrap happens on first poll; if it fails the stream is that one
    /// diagnostics item.
    pub fn list<'a>(&'a self, request: &'a ListRequest) -> ListResultsStream<'a> {
        Box::pin(stream! {
            let mut diags = Diagnostics::new();
            let prepared = self.dispatch.prepare("List", Some(&request.config), None, &mut diags);
            let (client, ctx) = match prepared {
                Some(prepared) => prepared,
                None => {
                    yield ListResult::from_diagnostics(diags);
                    return;
                }
            };

            let mut results = intercepted_list_handler(
                self.interceptors.list(),
                |ctx, request| self.inner.list(ctx, request),
                client.as_ref(),
                &ctx,
                request,
            );
            while let Some(result) = results.next().await {
                yield result;
            }
        })
    }
}
