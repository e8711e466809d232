#![allow(dead_code)]

use std::sync::Arc;
use parking_lot::Mutex;
use futures::stream;
use futures::StreamExt;
use tfprov_core::client::{AwsClient, ProviderClient, ProviderConfig};
use tfprov_core::context::CallContext;
use tfprov_core::protocol::*;
use tfprov_core::tags::KeyValueTags;
use tfprov_core::types::{Attribute, AttributeType, Object, Schema};
use tfprov_wrap::*;

pub const ACCOUNT_ID: &str = "123456789012";
pub const REGION: &str = "us-west-2";

pub type Calls = Arc<Mutex<Vec<String>>>;

/// Tags as the backing service holds them
pub type Remote = Arc<Mutex<KeyValueTags>>;

fn config() -> ProviderConfig {
    ProviderConfig {
        account_id: ACCOUNT_ID.into(),
        region: REGION.into(),
        ..Default::default()
    }
}

pub fn client() -> Arc<dyn AwsClient> {
    Arc::new(ProviderClient::new(config()))
}

pub fn tagging_client(default_tags: &[(&str, &str)], ignore_keys: &[&str]) -> Arc<dyn AwsClient> {
    let mut config = config();
    config.default_tags = default_tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    config.ignore_tags.keys = ignore_keys.iter().map(|k| k.to_string()).collect();
    Arc::new(ProviderClient::new(config))
}

pub fn tags(pairs: &[(&str, &str)]) -> KeyValueTags {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

pub fn tagged_schema() -> Schema {
    Schema::new()
        .with_attribute("name", Attribute::required(AttributeType::String))
        .with_attribute("arn", Attribute::computed(AttributeType::String))
        .with_attribute("tags", Attribute::optional(AttributeType::StringMap))
        .with_attribute("tags_all", Attribute::computed(AttributeType::StringMap))
}

/// Resource handler that records which verbs reached it
pub struct Things {
    pub calls: Calls,
    pub schema: Schema,
    pub own_import: bool,
    /// Receives the tags sent on create; reported back on read along with tags set outside the provider
    pub remote: Remote,
    pub outside_tags: KeyValueTags,
}

impl Things {
    pub fn new(calls: &Calls) -> Self {
        Self {
            calls: calls.clone(),
            schema: tagged_schema(),
            own_import: false,
            remote: Remote::default(),
            outside_tags: KeyValueTags::new(),
        }
    }

    pub fn with_remote(mut self, remote: &Remote, outside_tags: KeyValueTags) -> Self {
        self.remote = remote.clone();
        self.outside_tags = outside_tags;
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_own_import(mut self) -> Self {
        self.own_import = true;
        self
    }

    fn record(&self, verb: &str) {
        self.calls.lock().push(verb.to_string());
    }
}

#[async_trait::async_trait]
impl ResourceHandler for Things {
    fn metadata(&self, request: &MetadataRequest, response: &mut MetadataResponse) {
        response.type_name = format!("{}_thing", request.provider_type_name);
    }

    async fn configure(&self, _request: &ConfigureRequest, _response: &mut ConfigureResponse) {
        self.record("configure");
    }

    async fn schema(&self, _ctx: &CallContext, _request: &SchemaRequest, response: &mut SchemaResponse) {
        self.record("schema");
        response.schema = self.schema.clone();
    }

    async fn create(&self, ctx: &CallContext, request: &CreateRequest, response: &mut CreateResponse) {
        self.record("create");
        if let Some(tags_in) = ctx.tags.as_ref().and_then(|t| t.tags_in()) {
            *self.remote.lock() = tags_in;
        }
        response.state = Some(request.plan.clone());
    }

    async fn read(&self, ctx: &CallContext, request: &ReadRequest, response: &mut ReadResponse) {
        self.record("read");
        if let Some(tags_ctx) = &ctx.tags {
            tags_ctx.set_tags_out(self.remote.lock().merge(&self.outside_tags));
        }
        response.state = request.state.clone();
    }

    async fn update(&self, _ctx: &CallContext, request: &UpdateRequest, response: &mut UpdateResponse) {
        self.record("update");
        response.state = Some(request.plan.clone());
    }

    async fn delete(&self, _ctx: &CallContext, _request: &DeleteRequest, _response: &mut DeleteResponse) {
        self.record("delete");
    }

    async fn modify_plan(&self, _ctx: &CallContext, _request: &ModifyPlanRequest, _response: &mut ModifyPlanResponse) {
        self.record("modify_plan");
    }

    fn implements_import(&self) -> bool {
        self.own_import
    }

    async fn import_state(&self, _ctx: &CallContext, request: &ImportStateRequest, response: &mut ImportStateResponse) {
        self.record("import_state");
        response.state.set("id", request.id.as_str());
    }
}

/// List handler producing `count` named results
pub struct ThingLister {
    pub calls: Calls,
    pub count: usize,
}

#[async_trait::async_trait]
impl ListResourceHandler for ThingLister {
    fn metadata(&self, _request: &MetadataRequest, response: &mut MetadataResponse) {
        response.type_name = "aws_thing".into();
    }

    async fn schema(&self, _ctx: &CallContext, _request: &SchemaRequest, response: &mut SchemaResponse) {
        response.schema = Schema::new().with_attribute("name_prefix", Attribute::optional(AttributeType::String));
    }

    fn list<'a>(&'a self, _ctx: &'a CallContext, _request: &'a ListRequest) -> ListResultsStream<'a> {
        let calls = self.calls.clone();
        stream::iter(0..self.count)
            .map(move |i| {
                calls.lock().push(format!("list:{}", i));
                ListResult {
                    display_name: format!("thing-{}", i),
                    resource: Some(Object::new().with("name", format!("thing-{}", i))),
                    ..Default::default()
                }
            })
            .boxed()
    }
}

/// Service package built from fixed registrations
#[derive(Default)]
pub struct Package {
    pub resources: Vec<ResourceRegistration>,
    pub data_sources: Vec<DataSourceRegistration>,
    pub ephemeral_resources: Vec<EphemeralRegistration>,
    pub actions: Vec<ActionRegistration>,
    pub list_resources: Vec<ListResourceRegistration>,
}

impl ServicePackageDefinition for Package {
    fn name(&self) -> &str {
        "svc"
    }

    fn resources(&self) -> Vec<ResourceRegistration> {
        self.resources.clone()
    }

    fn data_sources(&self) -> Vec<DataSourceRegistration> {
        self.data_sources.clone()
    }

    fn ephemeral_resources(&self) -> Vec<EphemeralRegistration> {
        self.ephemeral_resources.clone()
    }

    fn actions(&self) -> Vec<ActionRegistration> {
        self.actions.clone()
    }

    fn list_resources(&self) -> Vec<ListResourceRegistration> {
        self.list_resources.clone()
    }
}

pub fn definitions(package: Package) -> Vec<Arc<dyn ServicePackageDefinition>> {
    vec![Arc::new(package)]
}

pub fn entries(calls: &Calls) -> Vec<String> {
    calls.lock().clone()
}
