use futures::future::BoxFuture;
use futures::StreamExt;
use crate::client::AwsClient;
use crate::context::CallContext;
use crate::interceptor::{Intercept, InterceptorOptions, ListIntercept, ListInterceptorOptions};
use crate::protocol::{ListRequest, ListResult, ListResultsStream, Response};
use crate::when::When;

/// Runs `inner` wrapped by `interceptors` (Filter Chain Pattern).
///
/// - Before: registration order; the first error stops everything, `inner` and all later
///   phases included.
/// - After or OnError (decided by the response after `inner`): reverse order.
/// - Finally: reverse order.
///
/// Diagnostics only ever get appended to the response.
pub async fn intercepted_handler<Req, Resp, F>(
    interceptors: &[&dyn Intercept<Req, Resp>],
    inner: F,
    client: &dyn AwsClient,
    ctx: &CallContext,
    request: &mut Req,
    response: &mut Resp,
) where
    Req: Send + Sync,
    Resp: Response + Send,
    F: for<'a> FnOnce(&'a CallContext, &'a Req, &'a mut Resp) -> BoxFuture<'a, ()> + Send,
{
    for (index, interceptor) in interceptors.iter().enumerate() {
        let opts = InterceptorOptions {
            client,
            request: &mut *request,
            response: &mut *response,
            when: When::BEFORE,
        };
        interceptor.intercept(ctx, opts).await;

        if response.has_error() {
            log::debug!(
                "[{}] {}: Before interceptor #{} reported an error, skipping the rest of the chain",
                ctx.call_id, ctx.type_name, index
            );
            return;
        }
    }

    inner(ctx, &*request, &mut *response).await;

    let when = When::after_inner(response.has_error());
    for phase in [when, When::FINALLY] {
        for interceptor in interceptors.iter().rev() {
            let opts = InterceptorOptions {
                client,
                request: &mut *request,
                response: &mut *response,
                when: phase,
            };
            interceptor.intercept(ctx, opts).await;
        }
    }
}

/// Streaming counterpart of [`intercepted_handler`] for the List verb.
///
/// Nothing runs until the returned stream is polled. Before-phase diagnostics come out
/// ahead of any inner result, After/OnError and Finally diagnostics after the inner stream
/// is drained. Dropping the stream early skips whatever has not run yet.
pub fn intercepted_list_handler<'a, F>(
    interceptors: Vec<&'a dyn ListIntercept>,
    inner: F,
    client: &'a dyn AwsClient,
    ctx: &'a CallContext,
    request: &'a ListRequest,
) -> ListResultsStream<'a>
where
    F: FnOnce(&'a CallContext, &'a ListRequest) -> ListResultsStream<'a> + Send + 'a,
{
    Box::pin(async_stream::stream! {
        for interceptor in interceptors.iter() {
            let opts = ListInterceptorOptions { client, request, when: When::BEFORE };
            let diags = interceptor.intercept(ctx, opts).await;
            let has_error = diags.has_error();
            if !diags.is_empty() {
                yield ListResult::from_diagnostics(diags);
            }
            if has_error {
                log::debug!("[{}] {}: Before list interceptor reported an error", ctx.call_id, ctx.type_name);
                return;
            }
        }

        let mut has_error = false;
        let mut results = inner(ctx, request);
        while let Some(result) = results.next().await {
            has_error |= result.has_error();
            yield result;
        }
        drop(results);

        for phase in [When::after_inner(has_error), When::FINALLY] {
            for interceptor in interceptors.iter().rev() {
                let opts = ListInterceptorOptions { client, request, when: phase };
                let diags = interceptor.intercept(ctx, opts).await;
                if !diags.is_empty() {
                    yield ListResult::from_diagnostics(diags);
                }
            }
        }
    })
}
