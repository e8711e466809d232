//! Per-resource `region` support.
//!
//! A resource that opts in gets an optional+computed `region` attribute, defaulted to the
//! provider's configured region, validated against the configured partition, mirrored into
//! state after every read and forcing replacement when it changes.

use lazy_static::lazy_static;
use regex::Regex;
use tfprov_core::client::AwsClient;
use tfprov_core::context::CallContext;
use tfprov_core::diag::Diagnostics;
use tfprov_core::interceptor::*;
use tfprov_core::names::ATTR_REGION;
use tfprov_core::protocol::*;
use tfprov_core::types::{Attribute, AttributePath, AttributeType, Value};
use tfprov_core::When;

pub const REGION_ATTRIBUTE_DESCRIPTION: &str =
    "Region where this resource will be managed. Defaults to the Region set in the provider configuration.";

const INVALID_REGION_VALUE: &str = "Invalid Region Value";

lazy_static! {
    /// `<id>@<region>`, where the region looks like `us-west-2` or `us-gov-east-1`
    static ref IMPORT_ID_WITH_REGION: Regex =
        Regex::new(r"^(.+)@([a-z]{2,4}(?:-[a-z]+)+-\d{1,2})$").expect("valid import ID regex");
}

/// Splits an `<id>@<region>` import ID
pub fn split_import_id(id: &str) -> Option<(&str, &str)> {
    let captures = IMPORT_ID_WITH_REGION.captures(id)?;
    Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
}

fn validate(client: &dyn AwsClient, ctx: &CallContext) -> Diagnostics {
    let mut diags = Diagnostics::new();
    if let Err(e) = client.validate_in_context_region_in_partition(ctx) {
        log::debug!("[{}] {}: {}", ctx.call_id, ctx.type_name, e);
        diags.add_attribute_error(AttributePath::root(ATTR_REGION), INVALID_REGION_VALUE, e.to_string());
    }
    diags
}

/// Adds the `region` attribute to a schema that does not define one
pub struct InjectRegionAttribute;

#[async_trait::async_trait]
impl Intercept<SchemaRequest, SchemaResponse> for InjectRegionAttribute {
    async fn intercept(&self, _ctx: &CallContext, opts: InterceptorOptions<'_, SchemaRequest, SchemaResponse>) {
        if opts.when != When::AFTER {
            return;
        }
        let schema = &mut opts.response.schema;
        if schema.attribute(ATTR_REGION).is_none() {
            schema.attributes.insert(
                ATTR_REGION.to_string(),
                Attribute::optional_computed(AttributeType::String).with_description(REGION_ATTRIBUTE_DESCRIPTION),
            );
        }
    }
}

impl Interceptor for InjectRegionAttribute {
    fn name(&self) -> &'static str {
        "InjectRegionAttribute"
    }

    fn schema(&self) -> Option<&SchemaIntercept> {
        Some(self)
    }
}

/// Rejects a region outside the configured partition before anything else happens
pub struct ValidateRegion;

macro_rules! validate_region_for {
    ($($req:ty => $resp:ty),+ $(,)?) => {
        $(
            #[async_trait::async_trait]
            impl Intercept<$req, $resp> for ValidateRegion {
                async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, $req, $resp>) {
                    if opts.when == When::BEFORE {
                        let diags = validate(opts.client, ctx);
                        opts.response.diagnostics.append(diags);
                    }
                }
            }
        )+
    };
}

validate_region_for! {
    ModifyPlanRequest => ModifyPlanResponse,
    ReadDataSourceRequest => ReadDataSourceResponse,
    OpenEphemeralRequest => OpenEphemeralResponse,
    InvokeActionRequest => InvokeActionResponse,
}

#[async_trait::async_trait]
impl ListIntercept for ValidateRegion {
    async fn intercept(&self, ctx: &CallContext, opts: ListInterceptorOptions<'_>) -> Diagnostics {
        if opts.when != When::BEFORE {
            return Diagnostics::new();
        }
        validate(opts.client, ctx)
    }
}

impl Interceptor for ValidateRegion {
    fn name(&self) -> &'static str {
        "ValidateRegion"
    }

    fn resource_modify_plan(&self) -> Option<&ModifyPlanIntercept> {
        Some(self)
    }

    fn data_source_read(&self) -> Option<&DataSourceReadIntercept> {
        Some(self)
    }

    fn ephemeral_open(&self) -> Option<&EphemeralOpenIntercept> {
        Some(self)
    }

    fn action_invoke(&self) -> Option<&ActionInvokeIntercept> {
        Some(self)
    }

    fn list(&self) -> Option<&dyn ListIntercept> {
        Some(self)
    }
}

/// Fills a null or unknown planned `region` with the configured region
pub struct DefaultRegion;

#[async_trait::async_trait]
impl Intercept<ModifyPlanRequest, ModifyPlanResponse> for DefaultRegion {
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, ModifyPlanRequest, ModifyPlanResponse>) {
        if opts.when != When::BEFORE {
            return;
        }
        // Destroy.
        let Some(plan) = opts.response.plan.as_mut() else {
            return;
        };
        if plan.get(ATTR_REGION).is_null_or_unknown() {
            plan.set(ATTR_REGION, opts.client.aws_config(ctx).region);
        }
    }
}

impl Interceptor for DefaultRegion {
    fn name(&self) -> &'static str {
        "DefaultRegion"
    }

    fn resource_modify_plan(&self) -> Option<&ModifyPlanIntercept> {
        Some(self)
    }
}

/// Requires replacement when the planned region differs from the one in state.
///
/// State written before per-resource regions existed has no `region`; planning the
/// configured region against such state is not a change.
pub struct ForceNewIfRegionChanges;

#[async_trait::async_trait]
impl Intercept<ModifyPlanRequest, ModifyPlanResponse> for ForceNewIfRegionChanges {
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, ModifyPlanRequest, ModifyPlanResponse>) {
        if opts.when != When::BEFORE {
            return;
        }
        let (Some(plan), Some(state)) = (opts.response.plan.as_ref(), opts.request.state.as_ref()) else {
            return;
        };

        let plan_region = plan.get(ATTR_REGION);
        let state_region = state.get(ATTR_REGION);

        if state_region.is_null() && plan_region.as_str() == Some(opts.client.aws_config(ctx).region.as_str()) {
            return;
        }

        if plan_region != state_region {
            log::debug!(
                "[{}] {}: region changes from {:?} to {:?}, requires replacement",
                ctx.call_id, ctx.type_name, state_region, plan_region
            );
            opts.response.requires_replace.push(AttributePath::root(ATTR_REGION));
        }
    }
}

impl Interceptor for ForceNewIfRegionChanges {
    fn name(&self) -> &'static str {
        "ForceNewIfRegionChanges"
    }

    fn resource_modify_plan(&self) -> Option<&ModifyPlanIntercept> {
        Some(self)
    }
}

/// Writes the in-context region into state after a read or open
pub struct SetRegionInState;

#[async_trait::async_trait]
impl Intercept<ReadRequest, ReadResponse> for SetRegionInState {
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, ReadRequest, ReadResponse>) {
        if opts.when != When::AFTER {
            return;
        }
        // Gone.
        if let Some(state) = opts.response.state.as_mut() {
            state.set(ATTR_REGION, opts.client.region(ctx));
        }
    }
}

#[async_trait::async_trait]
impl Intercept<ReadDataSourceRequest, ReadDataSourceResponse> for SetRegionInState {
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, ReadDataSourceRequest, ReadDataSourceResponse>) {
        if opts.when != When::AFTER {
            return;
        }
        if let Some(state) = opts.response.state.as_mut() {
            state.set(ATTR_REGION, opts.client.region(ctx));
        }
    }
}

#[async_trait::async_trait]
impl Intercept<OpenEphemeralRequest, OpenEphemeralResponse> for SetRegionInState {
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, OpenEphemeralRequest, OpenEphemeralResponse>) {
        if opts.when != When::AFTER {
            return;
        }
        if let Some(result) = opts.response.result.as_mut() {
            result.set(ATTR_REGION, opts.client.region(ctx));
        }
    }
}

impl Interceptor for SetRegionInState {
    fn name(&self) -> &'static str {
        "SetRegionInState"
    }

    fn resource_read(&self) -> Option<&ReadIntercept> {
        Some(self)
    }

    fn data_source_read(&self) -> Option<&DataSourceReadIntercept> {
        Some(self)
    }

    fn ephemeral_open(&self) -> Option<&EphemeralOpenIntercept> {
        Some(self)
    }
}

/// Sets the imported resource's region from the import ID or identity.
///
/// `<id>@<region>` has its suffix stripped from the request so that the inner import
/// sees the bare ID. With `default_region` unset (resources whose region comes from
/// the identity itself) only the suffix form is handled.
pub struct ImportRegion {
    default_region: bool,
}

impl ImportRegion {
    pub fn new() -> Self {
        Self { default_region: true }
    }

    pub fn without_default() -> Self {
        Self { default_region: false }
    }
}

impl Default for ImportRegion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Intercept<ImportStateRequest, ImportStateResponse> for ImportRegion {
    async fn intercept(&self, ctx: &CallContext, opts: InterceptorOptions<'_, ImportStateRequest, ImportStateResponse>) {
        if opts.when != When::BEFORE {
            return;
        }
        let request = opts.request;
        let state = &mut opts.response.state;

        if !request.id.is_empty() {
            if let Some((id, region)) = split_import_id(&request.id) {
                let (id, region) = (id.to_string(), region.to_string());
                log::debug!("[{}] {}: importing {} in {}", ctx.call_id, ctx.type_name, id, region);
                request.id = id;
                state.set(ATTR_REGION, region);
            } else if self.default_region {
                state.set(ATTR_REGION, opts.client.aws_config(ctx).region);
            }
            return;
        }

        if !self.default_region {
            return;
        }

        let region = request
            .identity
            .as_ref()
            .and_then(|identity| identity.get(ATTR_REGION))
            .map(str::to_string)
            .unwrap_or_else(|| opts.client.aws_config(ctx).region);
        state.set(ATTR_REGION, Value::from(region));
    }
}

impl Interceptor for ImportRegion {
    fn name(&self) -> &'static str {
        if self.default_region { "ImportRegion" } else { "ImportRegionNoDefault" }
    }

    fn resource_import_state(&self) -> Option<&ImportStateIntercept> {
        Some(self)
    }
}
