//! Transparent tagging.
//!
//! Resources only ever see `tags`. Provider default tags are merged in before the inner
//! handler runs, `tags_all` is computed at plan time, and after a read the tags reported
//! by the API are split back into what the user configured and the full set.

use std::collections::BTreeSet;
use std::sync::Arc;
use tfprov_core::client::{AwsClient, ServicePackage};
use tfprov_core::context::CallContext;
use tfprov_core::diag::{Diagnostic, Diagnostics};
use tfprov_core::interceptor::*;
use tfprov_core::names::{ATTR_TAGS, ATTR_TAGS_ALL};
use tfprov_core::protocol::*;
use tfprov_core::tags::{DefaultConfig, IgnoreConfig, KeyValueTags, TagPolicyConfig};
use tfprov_core::types::{AttributePath, Object, Value};
use tfprov_core::When;

/// Tag configuration in effect for this call: the context's when set, else the client's
struct TagConfigs {
    default_config: Option<DefaultConfig>,
    ignore_config: Option<IgnoreConfig>,
    tag_policy: Option<TagPolicyConfig>,
}

impl TagConfigs {
    fn resolve(client: &dyn AwsClient, ctx: &CallContext) -> Self {
        match &ctx.tags {
            Some(tags) => Self {
                default_config: tags.default_config.clone(),
                ignore_config: tags.ignore_config.clone(),
                tag_policy: tags.tag_policy.clone(),
            },
            None => Self {
                default_config: client.default_tags_config(ctx),
                ignore_config: client.ignore_tags_config(ctx),
                tag_policy: client.tag_policy_config(ctx),
            },
        }
    }
}

/// Where a resource's tags live in the backing service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagsSpec {
    /// State attribute holding the identifier the tag APIs take, e.g. `arn`
    pub identifier_attribute: String,
    pub resource_type: Option<String>,
}

impl TagsSpec {
    pub fn new(identifier_attribute: impl Into<String>) -> Self {
        Self {
            identifier_attribute: identifier_attribute.into(),
            resource_type: None,
        }
    }

    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    fn identifier<'a>(&self, object: &'a Object) -> Option<&'a str> {
        if self.identifier_attribute.is_empty() {
            return None;
        }
        object.get_string(&self.identifier_attribute).filter(|id| !id.is_empty())
    }
}

fn service_package(client: &dyn AwsClient, ctx: &CallContext) -> Option<Arc<dyn ServicePackage>> {
    client.service_package(&ctx.service_package)
}

/// Reads tags back through the service package when the inner handler did not report them.
///
/// Returns `None` after adding an error diagnostic.
async fn tags_from_api(
    spec: &TagsSpec,
    client: &dyn AwsClient,
    ctx: &CallContext,
    state: &Object,
    diags: &mut Diagnostics,
) -> Option<KeyValueTags> {
    if let Some(tags) = ctx.tags.as_ref().and_then(|t| t.tags_out()) {
        return Some(tags);
    }

    let (Some(identifier), Some(sp)) = (spec.identifier(state), service_package(client, ctx)) else {
        return Some(KeyValueTags::new());
    };

    match sp.list_tags(ctx, identifier, spec.resource_type.as_deref()).await {
        Ok(Some(tags)) => {
            if let Some(tags_ctx) = &ctx.tags {
                tags_ctx.set_tags_out(tags.clone());
            }
            Some(tags)
        }
        Ok(None) => Some(KeyValueTags::new()),
        Err(e) => {
            log::warn!("[{}] {}: listing tags for {}: {}", ctx.call_id, ctx.type_name, identifier, e);
            diags.add_error(format!("listing tags for {} ({})", ctx.type_name, identifier), e.to_string());
            None
        }
    }
}

fn set_tags_in(ctx: &CallContext, configs: &TagConfigs, plan: &Object) {
    let Some(tags_ctx) = &ctx.tags else {
        return;
    };
    let tags = KeyValueTags::from_value(plan.get(ATTR_TAGS));
    let tags_in = DefaultConfig::merge_tags(configs.default_config.as_ref(), &tags)
        .ignore_system()
        .ignore_config(configs.ignore_config.as_ref());
    log::debug!("[{}] {}: tags in {}", ctx.call_id, ctx.type_name, ctx.logging.render_tags(&tags_in));
    tags_ctx.set_tags_in(tags_in);
}

fn set_tags_all_from_tags_in(ctx: &CallContext, configs: &TagConfigs, state: Option<&mut Object>) {
    let (Some(state), Some(tags_in)) = (state, ctx.tags.as_ref().and_then(|t| t.tags_in())) else {
        return;
    };
    let tags_all = tags_in.ignore_system().ignore_config(configs.ignore_config.as_ref());
    state.set(ATTR_TAGS_ALL, tags_all.to_value());
}

/// Tag handling around a resource's CRUD verbs
pub struct TransparentTagging {
    spec: TagsSpec,
}

impl TransparentTagging {
    pub fn new(spec: TagsSpec) -> Self {
        Self { spec }
    }
}

#[async_trait::async_trait]
impl Intercept<CreateRequest, CreateResponse> for TransparentTagging {
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, CreateRequest, CreateResponse>) {
        let configs = TagConfigs::resolve(opts.client, ctx);
        match opts.when {
            When::BEFORE => set_tags_in(ctx, &configs, &opts.request.plan),
            When::AFTER => set_tags_all_from_tags_in(ctx, &configs, opts.response.state.as_mut()),
            _ => {}
        }
    }
}

#[async_trait::async_trait]
impl Intercept<ReadRequest, ReadResponse> for TransparentTagging {
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, ReadRequest, ReadResponse>) {
        if opts.when != When::AFTER {
            return;
        }
        let response = opts.response;
        let Some(state) = response.state.as_mut() else {
            return;
        };

        let Some(api_tags) = tags_from_api(&self.spec, opts.client, ctx, state, &mut response.diagnostics).await else {
            return;
        };

        let configs = TagConfigs::resolve(opts.client, ctx);
        let api_tags = api_tags.ignore_system().ignore_config(configs.ignore_config.as_ref());
        let tags = api_tags.resolve_duplicates(
            configs.default_config.as_ref(),
            configs.ignore_config.as_ref(),
            state.get(ATTR_TAGS),
        );

        state.set(ATTR_TAGS, tags.to_value_or_null());
        state.set(ATTR_TAGS_ALL, api_tags.to_value());
    }
}

#[async_trait::async_trait]
impl Intercept<UpdateRequest, UpdateResponse> for TransparentTagging {
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, UpdateRequest, UpdateResponse>) {
        let configs = TagConfigs::resolve(opts.client, ctx);
        match opts.when {
            When::BEFORE => {
                let request = &*opts.request;
                set_tags_in(ctx, &configs, &request.plan);

                let old = KeyValueTags::from_value(request.state.get(ATTR_TAGS_ALL));
                let new = KeyValueTags::from_value(request.plan.get(ATTR_TAGS_ALL));
                if old == new {
                    return;
                }
                let identifier = self.spec.identifier(&request.plan).or_else(|| self.spec.identifier(&request.state));
                let (Some(identifier), Some(sp)) = (identifier, service_package(opts.client, ctx)) else {
                    return;
                };

                log::debug!(
                    "[{}] {}: updating tags for {} to {}",
                    ctx.call_id, ctx.type_name, identifier, ctx.logging.render_tags(&new)
                );
                if let Err(e) = sp.update_tags(ctx, identifier, self.spec.resource_type.as_deref(), &old, &new).await {
                    log::warn!("[{}] {}: updating tags for {}: {}", ctx.call_id, ctx.type_name, identifier, e);
                    opts.response
                        .diagnostics
                        .add_error(format!("updating tags for {} ({})", ctx.type_name, identifier), e.to_string());
                }
            }
            When::AFTER => set_tags_all_from_tags_in(ctx, &configs, opts.response.state.as_mut()),
            _ => {}
        }
    }
}

impl Interceptor for TransparentTagging {
    fn name(&self) -> &'static str {
        "TransparentTagging"
    }

    fn resource_create(&self) -> Option<&CreateIntercept> {
        Some(self)
    }

    fn resource_read(&self) -> Option<&ReadIntercept> {
        Some(self)
    }

    fn resource_update(&self) -> Option<&UpdateIntercept> {
        Some(self)
    }
}

/// Data sources report `tags` as read, minus system and ignored keys
pub struct DataSourceTagging {
    spec: TagsSpec,
}

impl DataSourceTagging {
    pub fn new(spec: TagsSpec) -> Self {
        Self { spec }
    }
}

#[async_trait::async_trait]
impl Intercept<ReadDataSourceRequest, ReadDataSourceResponse> for DataSourceTagging {
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, ReadDataSourceRequest, ReadDataSourceResponse>) {
        if opts.when != When::AFTER {
            return;
        }
        let response = opts.response;
        let Some(state) = response.state.as_mut() else {
            return;
        };
        let Some(api_tags) = tags_from_api(&self.spec, opts.client, ctx, state, &mut response.diagnostics).await else {
            return;
        };

        let configs = TagConfigs::resolve(opts.client, ctx);
        let tags = api_tags.ignore_system().ignore_config(configs.ignore_config.as_ref());
        state.set(ATTR_TAGS, tags.to_value());
    }
}

impl Interceptor for DataSourceTagging {
    fn name(&self) -> &'static str {
        "DataSourceTagging"
    }

    fn data_source_read(&self) -> Option<&DataSourceReadIntercept> {
        Some(self)
    }
}

/// Computes the planned `tags_all`: default tags merged with `tags`, or unknown while any tag is
pub struct SetTagsAll;

#[async_trait::async_trait]
impl Intercept<ModifyPlanRequest, ModifyPlanResponse> for SetTagsAll {
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, ModifyPlanRequest, ModifyPlanResponse>) {
        if opts.when != When::BEFORE {
            return;
        }
        let Some(plan) = opts.response.plan.as_mut() else {
            return;
        };

        let tags = plan.get(ATTR_TAGS);
        let tags_all = if tags.is_fully_known() {
            let configs = TagConfigs::resolve(opts.client, ctx);
            DefaultConfig::merge_tags(configs.default_config.as_ref(), &KeyValueTags::from_value(tags))
                .ignore_config(configs.ignore_config.as_ref())
                .to_value()
        } else {
            Value::Unknown
        };
        plan.set(ATTR_TAGS_ALL, tags_all);
    }
}

impl Interceptor for SetTagsAll {
    fn name(&self) -> &'static str {
        "SetTagsAll"
    }

    fn resource_modify_plan(&self) -> Option<&ModifyPlanIntercept> {
        Some(self)
    }
}

pub const MISSING_REQUIRED_TAGS: &str = "Missing Required Tags";

/// Enforces the provider's tag policy at plan time.
///
/// A key counts as present even while its value is unknown. Updates are only checked when
/// the effective tag set changes, so an out-of-policy resource can still be planned until
/// its tags are touched.
pub struct ValidateRequiredTags;

impl ValidateRequiredTags {
    fn missing_keys(
        required: &BTreeSet<String>,
        configs: &TagConfigs,
        tags: &Value,
    ) -> Vec<String> {
        let mut present: BTreeSet<String> = tags.as_map().map(|m| m.keys().cloned().collect()).unwrap_or_default();
        if let Some(default_config) = &configs.default_config {
            present.extend(default_config.tags.keys().cloned());
        }
        if let Some(ignore_config) = &configs.ignore_config {
            present.retain(|k| !ignore_config.ignores(k));
        }
        required.iter().filter(|k| !present.contains(*k)).cloned().collect()
    }

    fn tags_changed(configs: &TagConfigs, tags: &Value, state: Option<&Object>) -> bool {
        let Some(state) = state else {
            return true;
        };
        if !tags.is_fully_known() {
            return true;
        }
        let merged = DefaultConfig::merge_tags(configs.default_config.as_ref(), &KeyValueTags::from_value(tags))
            .ignore_config(configs.ignore_config.as_ref());
        merged != KeyValueTags::from_value(state.get(ATTR_TAGS_ALL))
    }
}

#[async_trait::async_trait]
impl Intercept<ModifyPlanRequest, ModifyPlanResponse> for ValidateRequiredTags {
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, ModifyPlanRequest, ModifyPlanResponse>) {
        if opts.when != When::BEFORE {
            return;
        }
        let Some(plan) = opts.response.plan.as_ref() else {
            return;
        };
        let configs = TagConfigs::resolve(opts.client, ctx);
        let Some(policy) = &configs.tag_policy else {
            return;
        };
        let Some(required) = policy.required_for(&ctx.type_name).filter(|r| !r.is_empty()) else {
            return;
        };

        let tags = plan.get(ATTR_TAGS);
        if tags.is_unknown() {
            return;
        }
        if !Self::tags_changed(&configs, tags, opts.request.state.as_ref()) {
            return;
        }

        let missing = Self::missing_keys(required, &configs, tags);
        if missing.is_empty() {
            return;
        }
        log::debug!("[{}] {}: missing required tags {:?}", ctx.call_id, ctx.type_name, missing);

        let diagnostic = Diagnostic::new(
            policy.severity.into(),
            MISSING_REQUIRED_TAGS,
            format!(
                "The {} resource is missing required tag key(s): {}",
                ctx.type_name,
                missing.join(", ")
            ),
        )
        .at(AttributePath::root(ATTR_TAGS));
        opts.response.diagnostics.push(diagnostic);
    }
}

impl Interceptor for ValidateRequiredTags {
    fn name(&self) -> &'static str {
        "ValidateRequiredTags"
    }

    fn resource_modify_plan(&self) -> Option<&ModifyPlanIntercept> {
        Some(self)
    }
}
