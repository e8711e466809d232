//! Per-call context derivation shared by every dispatcher.

use std::sync::Arc;
use parking_lot::RwLock;
use tfprov_core::client::{AwsClient, AwsConfig, ServicePackage};
use tfprov_core::context::{CallContext, TagsContext, UserAgentProduct};
use tfprov_core::diag::Diagnostics;
use tfprov_core::error::{ProviderError, ProviderResult};
use tfprov_core::names::{ATTR_REGION, ATTR_USER_AGENT};
use tfprov_core::tags::{DefaultConfig, IgnoreConfig, TagPolicyConfig};
use tfprov_core::types::{Object, Value};

pub const UNCONFIGURED_CLIENT: &str = "Unconfigured AWS Client";
pub const INVALID_REGION_VALUE: &str = "Invalid Region Value";
pub const INVALID_PROVIDER_META: &str = "Invalid Provider Meta";

/// What a dispatcher wraps, and which per-call extras its context needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallTarget {
    pub service_package: String,
    pub name: String,
    pub type_name: String,
    /// Read the `region` attribute as a per-call override
    pub region_override: bool,
    /// Carry a tag context
    pub tags: bool,
}

impl CallTarget {
    pub fn new(service_package: impl Into<String>, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            service_package: service_package.into(),
            name: name.into(),
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn with_region_override(mut self, enabled: bool) -> Self {
        self.region_override = enabled;
        self
    }

    pub fn with_tags(mut self, enabled: bool) -> Self {
        self.tags = enabled;
        self
    }
}

/// Builds the context for one call.
///
/// `region_source` is the object the verb takes its region override from (plan, state or
/// config); `None` for verbs that have no region to read.
pub fn bootstrap(
    client: &dyn AwsClient,
    target: &CallTarget,
    region_source: Option<&Object>,
    provider_meta: Option<&Object>,
) -> ProviderResult<CallContext> {
    let mut ctx = CallContext::new(&target.service_package, &target.name, &target.type_name);

    if target.region_override {
        if let Some(source) = region_source {
            ctx = ctx.with_override_region(region_override(source)?);
        }
    }

    if let Some(meta) = provider_meta {
        ctx = ctx.with_user_agent(user_agent(meta)?);
    }

    if target.tags {
        let tags = TagsContext::new(
            client.default_tags_config(&ctx),
            client.ignore_tags_config(&ctx),
            client.tag_policy_config(&ctx),
        );
        ctx = ctx.with_tags(tags);
    }

    Ok(ctx.with_logging(client.log_redaction()))
}

fn region_override(source: &Object) -> ProviderResult<Option<String>> {
    match source.get(ATTR_REGION) {
        Value::String(region) => Ok(Some(region.clone())),
        Value::Null | Value::Unknown => Ok(None),
        other => Err(ProviderError::bootstrap(
            INVALID_REGION_VALUE,
            format!("expected `region` to be a string, got {}", other.type_name()),
        )),
    }
}

fn user_agent(meta: &Object) -> ProviderResult<Vec<UserAgentProduct>> {
    let invalid = |got: &str| {
        ProviderError::bootstrap(
            INVALID_PROVIDER_META,
            format!("expected `{}` to be a list of strings, got {}", ATTR_USER_AGENT, got),
        )
    };
    match meta.get(ATTR_USER_AGENT) {
        Value::Null => Ok(Vec::new()),
        Value::List(values) => values
            .iter()
            .map(|v| v.as_str().map(UserAgentProduct::parse).ok_or_else(|| invalid(v.type_name())))
            .collect(),
        other => Err(invalid(other.type_name())),
    }
}

/// Client handed to a dispatcher by Configure
#[derive(Default)]
pub struct ClientSlot {
    client: RwLock<Option<Arc<dyn AwsClient>>>,
}

impl ClientSlot {
    pub fn set(&self, client: Arc<dyn AwsClient>) {
        *self.client.write() = Some(client);
    }

    pub fn get(&self) -> Option<Arc<dyn AwsClient>> {
        self.client.read().clone()
    }

    /// The configured client, or the unconfigured placeholder
    pub fn get_or_placeholder(&self) -> Arc<dyn AwsClient> {
        self.get().unwrap_or_else(|| Arc::new(UnconfiguredClient))
    }
}

/// Common front half of every dispatcher verb
#[derive(Default)]
pub struct Dispatch {
    pub target: CallTarget,
    pub client: ClientSlot,
}

impl Dispatch {
    pub fn new(target: CallTarget) -> Self {
        Self { target, client: ClientSlot::default() }
    }

    /// Client and context for a verb, or `None` after reporting why not
    pub fn prepare(
        &self,
        verb: &str,
        region_source: Option<&Object>,
        provider_meta: Option<&Object>,
        diags: &mut Diagnostics,
    ) -> Option<(Arc<dyn AwsClient>, CallContext)> {
        let Some(client) = self.client.get() else {
            diags.add_error(
                UNCONFIGURED_CLIENT,
                format!("{} {} called before the provider was configured", self.target.type_name, verb),
            );
            return None;
        };
        match bootstrap(client.as_ref(), &self.target, region_source, provider_meta) {
            Ok(ctx) => {
                log::debug!("[{}] {}: {}", ctx.call_id, ctx.type_name, verb);
                Some((client, ctx))
            }
            Err(e) => {
                log::debug!("{}: {}: {}", self.target.type_name, verb, e);
                diags.push(e.into());
                None
            }
        }
    }

    /// Schema may be requested before Configure
    pub fn prepare_schema(&self) -> (Arc<dyn AwsClient>, CallContext) {
        let client = self.client.get_or_placeholder();
        let ctx = CallContext::new(&self.target.service_package, &self.target.name, &self.target.type_name)
            .with_logging(client.log_redaction());
        log::debug!("[{}] {}: Schema", ctx.call_id, ctx.type_name);
        (client, ctx)
    }
}

/// Stands in for the client until Configure. Answers with empty values.
pub struct UnconfiguredClient;

impl AwsClient for UnconfiguredClient {
    fn account_id(&self, _ctx: &CallContext) -> String {
        String::new()
    }

    fn region(&self, ctx: &CallContext) -> String {
        ctx.override_region().unwrap_or_default().to_string()
    }

    fn partition(&self, _ctx: &CallContext) -> String {
        String::new()
    }

    fn default_tags_config(&self, _ctx: &CallContext) -> Option<DefaultConfig> {
        None
    }

    fn ignore_tags_config(&self, _ctx: &CallContext) -> Option<IgnoreConfig> {
        None
    }

    fn tag_policy_config(&self, _ctx: &CallContext) -> Option<TagPolicyConfig> {
        None
    }

    fn validate_in_context_region_in_partition(&self, _ctx: &CallContext) -> ProviderResult<()> {
        Ok(())
    }

    fn aws_config(&self, _ctx: &CallContext) -> AwsConfig {
        AwsConfig::default()
    }

    fn service_package(&self, _name: &str) -> Option<Arc<dyn ServicePackage>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tfprov_core::client::{ProviderClient, ProviderConfig};

    fn client() -> ProviderClient {
        ProviderClient::new(ProviderConfig {
            account_id: "123456789012".into(),
            region: "us-west-2".into(),
            default_tags: [("Env".to_string(), "prod".to_string())].into_iter().collect(),
            log_masked_keys: vec!["secret".into()],
            ..Default::default()
        })
    }

    fn target() -> CallTarget {
        CallTarget::new("ec2", "VPC", "aws_vpc").with_region_override(true).with_tags(true)
    }

    #[test]
    fn region_override_from_source() {
        let client = client();
        let plan = Object::new().with(ATTR_REGION, "eu-west-1");

        let ctx = bootstrap(&client, &target(), Some(&plan), None).map(|ctx| ctx.override_region);

        assert_eq!(ctx, Ok(Some("eu-west-1".to_string())));
    }

    #[test]
    fn region_override_ignored_when_not_enabled() {
        let client = client();
        let plan = Object::new().with(ATTR_REGION, "eu-west-1");
        let target = CallTarget::new("ec2", "VPC", "aws_vpc");

        let ctx = bootstrap(&client, &target, Some(&plan), None).map(|ctx| ctx.override_region);

        assert_eq!(ctx, Ok(None));
    }

    #[test]
    fn unknown_region_is_no_override() {
        let client = client();
        let plan = Object::new().with(ATTR_REGION, Value::Unknown);

        let ctx = bootstrap(&client, &target(), Some(&plan), None).map(|ctx| ctx.override_region);

        assert_eq!(ctx, Ok(None));
    }

    #[test]
    fn non_string_region_is_an_error() {
        let client = client();
        let plan = Object::new().with(ATTR_REGION, 42i64);

        let err = bootstrap(&client, &target(), Some(&plan), None).err();

        assert_eq!(err.as_ref().map(|e| e.summary()), Some(INVALID_REGION_VALUE));
    }

    #[test]
    fn user_agent_from_provider_meta() {
        let client = client();
        let meta = Object::new().with(ATTR_USER_AGENT, Value::List(vec!["my-module/1.0 (+https://example.com)".into()]));

        let ctx = bootstrap(&client, &target(), None, Some(&meta));

        let products: Vec<String> = ctx.map(|c| c.user_agent.iter().map(|p| p.to_string()).collect()).unwrap_or_default();
        assert_eq!(products, vec!["my-module/1.0 (+https://example.com)"]);
    }

    #[test]
    fn malformed_provider_meta_is_an_error() {
        let client = client();
        for user_agent in [Value::string("my-module/1.0"), Value::List(vec![Value::Int(1)])] {
            let meta = Object::new().with(ATTR_USER_AGENT, user_agent);

            let err = bootstrap(&client, &target(), None, Some(&meta)).err();

            assert_eq!(err.as_ref().map(|e| e.summary()), Some(INVALID_PROVIDER_META));
        }
    }

    #[test]
    fn tags_and_logging_from_client() {
        let client = client();

        let ctx = bootstrap(&client, &target(), None, None).ok();

        let default_tags = ctx
            .as_ref()
            .and_then(|c| c.tags.as_ref())
            .and_then(|t| t.default_config.clone())
            .map(|d| d.tags.len());
        assert_eq!(default_tags, Some(1));
        assert_eq!(ctx.map(|c| c.logging.is_masked("secret")), Some(true));
    }

    #[test]
    fn unconfigured_dispatch_reports() {
        let dispatch = Dispatch::new(target());
        let mut diags = Diagnostics::new();

        assert!(dispatch.prepare("Create", None, None, &mut diags).is_none());
        assert_eq!(diags.summaries(), vec![UNCONFIGURED_CLIENT]);

        let (client, ctx) = dispatch.prepare_schema();
        assert_eq!(client.account_id(&ctx), "");
    }
}
