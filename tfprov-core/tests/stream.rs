use std::sync::Arc;
use futures::StreamExt;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tfprov_core::client::{ProviderClient, ProviderConfig};
use tfprov_core::interceptor::engine::intercepted_list_handler;
use tfprov_core::interceptor::{ListIntercept, ListInterceptorOptions};
use tfprov_core::protocol::{ListRequest, ListResult, ListResultsStream};
use tfprov_core::{CallContext, Diagnostics, Object, When};

type Log = Arc<Mutex<Vec<String>>>;

struct Recorder {
    name: &'static str,
    log: Log,
    fail_on: When,
}

#[async_trait::async_trait]
impl ListIntercept for Recorder {
    async fn intercept(&self, _ctx: &CallContext, opts: ListInterceptorOptions<'_>) -> Diagnostics {
        self.log.lock().push(format!("{}:{}", self.name, opts.when));
        let mut diags = Diagnostics::new();
        if opts.when == self.fail_on {
            diags.add_error(format!("{} failed", self.name), "");
        }
        diags
    }
}

fn recorder(name: &'static str, log: &Log) -> Recorder {
    Recorder { name, log: log.clone(), fail_on: When::empty() }
}

fn resources<'a>(log: Log, count: usize) -> ListResultsStream<'a> {
    Box::pin(async_stream::stream! {
        for i in 0..count {
            log.lock().push(format!("inner:{}", i));
            yield ListResult {
                resource: Some(Object::new().with("id", format!("r-{}", i))),
                display_name: format!("r-{}", i),
                ..Default::default()
            };
        }
    })
}

fn display_names(results: &[ListResult]) -> Vec<String> {
    results.iter().map(|r| r.display_name.clone()).collect()
}

#[tokio::test]
async fn stream_phases_match_scalar_order() {
    let log = Log::default();
    let client = ProviderClient::new(ProviderConfig::default());
    let ctx = CallContext::new("ec2", "VPC", "aws_vpc");
    let request = ListRequest::default();
    let a = recorder("a", &log);
    let b = recorder("b", &log);

    let inner_log = log.clone();
    let stream = intercepted_list_handler(
        vec![&a as &dyn ListIntercept, &b],
        move |_ctx, _req| resources(inner_log, 2),
        &client,
        &ctx,
        &request,
    );
    let results: Vec<ListResult> = stream.collect().await;

    assert_eq!(display_names(&results), vec!["r-0", "r-1"]);
    assert_eq!(
        log.lock().clone(),
        vec!["a:Before", "b:Before", "inner:0", "inner:1", "b:After", "a:After", "b:Finally", "a:Finally"]
    );
}

#[tokio::test]
async fn before_error_yields_diagnostics_and_stops() {
    let log = Log::default();
    let client = ProviderClient::new(ProviderConfig::default());
    let ctx = CallContext::new("ec2", "VPC", "aws_vpc");
    let request = ListRequest::default();
    let a = Recorder { name: "a", log: log.clone(), fail_on: When::BEFORE };
    let b = recorder("b", &log);

    let inner_log = log.clone();
    let results: Vec<ListResult> = intercepted_list_handler(
        vec![&a as &dyn ListIntercept, &b],
        move |_ctx, _req| resources(inner_log, 3),
        &client,
        &ctx,
        &request,
    )
    .collect()
    .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].diagnostics.summaries(), vec!["a failed"]);
    assert_eq!(log.lock().clone(), vec!["a:Before"]);
}

#[tokio::test]
async fn inner_error_item_switches_to_on_error() {
    let log = Log::default();
    let client = ProviderClient::new(ProviderConfig::default());
    let ctx = CallContext::new("ec2", "VPC", "aws_vpc");
    let request = ListRequest::default();
    let a = Recorder { name: "a", log: log.clone(), fail_on: When::ON_ERROR };

    let results: Vec<ListResult> = intercepted_list_handler(
        vec![&a as &dyn ListIntercept],
        |_ctx, _req| {
            let mut diags = Diagnostics::new();
            diags.add_error("listing failed", "");
            futures::stream::iter(vec![ListResult::from_diagnostics(diags)]).boxed()
        },
        &client,
        &ctx,
        &request,
    )
    .collect()
    .await;

    let summaries: Vec<Vec<&str>> = results.iter().map(|r| r.diagnostics.summaries()).collect();
    assert_eq!(summaries, vec![vec!["listing failed"], vec!["a failed"]]);
    assert_eq!(log.lock().clone(), vec!["a:Before", "a:OnError", "a:Finally"]);
}

#[tokio::test]
async fn nothing_runs_until_polled() {
    let log = Log::default();
    let client = ProviderClient::new(ProviderConfig::default());
    let ctx = CallContext::new("ec2", "VPC", "aws_vpc");
    let request = ListRequest::default();
    let a = recorder("a", &log);

    let inner_log = log.clone();
    let stream = intercepted_list_handler(vec![&a as &dyn ListIntercept], move |_ctx, _req| resources(inner_log, 1), &client, &ctx, &request);
    assert!(log.lock().is_empty());
    drop(stream);
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn early_drop_skips_remaining_phases() {
    let log = Log::default();
    let client = ProviderClient::new(ProviderConfig::default());
    let ctx = CallContext::new("ec2", "VPC", "aws_vpc");
    let request = ListRequest::default();
    let a = recorder("a", &log);

    let inner_log = log.clone();
    let mut stream = intercepted_list_handler(vec![&a as &dyn ListIntercept], move |_ctx, _req| resources(inner_log, 5), &client, &ctx, &request);
    let first = stream.next().await;
    drop(stream);

    assert_eq!(first.map(|r| r.display_name), Some("r-0".to_string()));
    assert_eq!(log.lock().clone(), vec!["a:Before", "inner:0"]);
}

#[tokio::test]
async fn empty_stream_still_runs_every_phase() {
    let log = Log::default();
    let client = ProviderClient::new(ProviderConfig::default());
    let ctx = CallContext::new("ec2", "VPC", "aws_vpc");
    let request = ListRequest::default();
    let a = recorder("a", &log);
    let b = Recorder { name: "b", log: log.clone(), fail_on: When::AFTER };
    let c = Recorder { name: "c", log: log.clone(), fail_on: When::FINALLY };

    let inner_log = log.clone();
    let results: Vec<ListResult> = intercepted_list_handler(
        vec![&a as &dyn ListIntercept, &b, &c],
        move |_ctx, _req| resources(inner_log, 0),
        &client,
        &ctx,
        &request,
    )
    .collect()
    .await;

    assert_eq!(
        log.lock().clone(),
        vec!["a:Before", "b:Before", "c:Before", "c:After", "b:After", "a:After", "c:Finally", "b:Finally", "a:Finally"]
    );
    let summaries: Vec<Vec<&str>> = results.iter().map(|r| r.diagnostics.summaries()).collect();
    assert_eq!(summaries, vec![vec!["b failed"], vec!["c failed"]]);
    assert!(results.iter().all(|r| r.resource.is_none()));
}
