//! Provider registration.
//!
//! Service packages declare what they implement; the provider turns each declaration into a
//! dispatcher with its interceptor list, rejecting inconsistent declarations up front.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tfprov_core::client::AwsClient;
use tfprov_core::context::CallContext;
use tfprov_core::diag::Diagnostics;
use tfprov_core::error::{ConfigurationError, ConfigurationErrors};
use tfprov_core::identity::{IdentitySpec, ImportSpec};
use tfprov_core::interceptor::InterceptorInvocations;
use tfprov_core::names::{ATTR_REGION, ATTR_TAGS, ATTR_TAGS_ALL};
use tfprov_core::protocol::{ConfigureRequest, ConfigureResponse, SchemaRequest, SchemaResponse};
use tfprov_core::types::Schema;
use tfprov_interceptors::{
    DataSourceTagging, DefaultRegion, ForceNewIfRegionChanges, IdentityInterceptor, ImportRegion, InjectRegionAttribute,
    SetRegionInState, SetTagsAll, TagsSpec, TransparentTagging, ValidateRegion, ValidateRequiredTags,
};
use crate::action::WrappedAction;
use crate::bootstrap::CallTarget;
use crate::data_source::WrappedDataSource;
use crate::ephemeral::WrappedEphemeralResource;
use crate::handler::{ActionHandler, DataSourceHandler, EphemeralHandler, ListResourceHandler, ResourceHandler};
use crate::list::WrappedListResource;
use crate::resource::WrappedResource;

const RESOURCE: &str = "resource";
const DATA_SOURCE: &str = "data source";
const EPHEMERAL_RESOURCE: &str = "ephemeral resource";
const ACTION: &str = "action";
const LIST_RESOURCE: &str = "list resource";

/// Per-resource `region` attribute options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionSpec {
    pub is_override_enabled: bool,
    pub is_validate_override_in_partition: bool,
}

impl RegionSpec {
    /// Overridable and validated against the configured partition
    pub fn enabled() -> Self {
        Self {
            is_override_enabled: true,
            is_validate_override_in_partition: true,
        }
    }
}

#[derive(Clone)]
pub struct ResourceRegistration {
    pub type_name: String,
    pub name: String,
    pub handler: Arc<dyn ResourceHandler>,
    pub region: RegionSpec,
    pub tags: Option<TagsSpec>,
    pub identity: IdentitySpec,
    pub import: ImportSpec,
}

impl ResourceRegistration {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>, handler: Arc<dyn ResourceHandler>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            handler,
            region: RegionSpec::default(),
            tags: None,
            identity: IdentitySpec::default(),
            import: ImportSpec::default(),
        }
    }

    pub fn with_region(mut self, region: RegionSpec) -> Self {
        self.region = region;
        self
    }

    pub fn with_tags(mut self, tags: TagsSpec) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_identity(mut self, identity: IdentitySpec) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_import(mut self, import: ImportSpec) -> Self {
        self.import = import;
        self
    }
}

#[derive(Clone)]
pub struct DataSourceRegistration {
    pub type_name: String,
    pub name: String,
    pub handler: Arc<dyn DataSourceHandler>,
    pub region: RegionSpec,
    pub tags: Option<TagsSpec>,
}

impl DataSourceRegistration {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>, handler: Arc<dyn DataSourceHandler>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            handler,
            region: RegionSpec::default(),
            tags: None,
        }
    }

    pub fn with_region(mut self, region: RegionSpec) -> Self {
        self.region = region;
        self
    }

    pub fn with_tags(mut self, tags: TagsSpec) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// Registration of a surface that only ever takes region options
pub struct Registration<H: ?Sized> {
    pub type_name: String,
    pub name: String,
    pub handler: Arc<H>,
    pub region: RegionSpec,
}

impl<H: ?Sized> Registration<H> {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>, handler: Arc<H>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            handler,
            region: RegionSpec::default(),
        }
    }

    pub fn with_region(mut self, region: RegionSpec) -> Self {
        self.region = region;
        self
    }
}

// Derived Clone would require `H: Clone`.
impl<H: ?Sized> Clone for Registration<H> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name.clone(),
            name: self.name.clone(),
            handler: self.handler.clone(),
            region: self.region,
        }
    }
}

pub type EphemeralRegistration = Registration<dyn EphemeralHandler>;
pub type ActionRegistration = Registration<dyn ActionHandler>;
pub type ListResourceRegistration = Registration<dyn ListResourceHandler>;

/// Everything one AWS service contributes to the provider
pub trait ServicePackageDefinition: Send + Sync {
    fn name(&self) -> &str;

    fn resources(&self) -> Vec<ResourceRegistration> {
        Vec::new()
    }

    fn data_sources(&self) -> Vec<DataSourceRegistration> {
        Vec::new()
    }

    fn ephemeral_resources(&self) -> Vec<EphemeralRegistration> {
        Vec::new()
    }

    fn actions(&self) -> Vec<ActionRegistration> {
        Vec::new()
    }

    fn list_resources(&self) -> Vec<ListResourceRegistration> {
        Vec::new()
    }
}

/// Schemas are validated once per guard, however many providers are built with it.
///
/// Only a successful validation is remembered: a provider that failed to build leaves the
/// guard untouched.
#[derive(Debug, Default)]
pub struct SchemaValidationGuard {
    validated: OnceCell<()>,
}

impl SchemaValidationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_validated(&self) -> bool {
        self.validated.initialized()
    }

    async fn validate_once<F, Fut>(&self, validate: F) -> Result<(), ConfigurationErrors>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ConfigurationErrors>,
    {
        self.validated
            .get_or_try_init(move || async move { validate().await.into_result(()) })
            .await
            .map(|_| ())
    }
}

fn region_interceptors(region: RegionSpec, interceptors: &mut InterceptorInvocations) {
    interceptors.push(Arc::new(InjectRegionAttribute));
    if region.is_validate_override_in_partition {
        interceptors.push(Arc::new(ValidateRegion));
    }
}

fn resource_interceptors(registration: &ResourceRegistration) -> InterceptorInvocations {
    let mut interceptors = InterceptorInvocations::new();

    if registration.region.is_override_enabled {
        region_interceptors(registration.region, &mut interceptors);
        interceptors.push(Arc::new(DefaultRegion));
        interceptors.push(Arc::new(SetRegionInState));
        interceptors.push(Arc::new(ForceNewIfRegionChanges));
        let import_region = if registration.identity.has_inherent_region {
            ImportRegion::without_default()
        } else {
            ImportRegion::new()
        };
        interceptors.push(Arc::new(import_region));
    }

    if let Some(tags) = &registration.tags {
        interceptors.push(Arc::new(TransparentTagging::new(tags.clone())));
        interceptors.push(Arc::new(SetTagsAll));
        interceptors.push(Arc::new(ValidateRequiredTags));
    }

    if !registration.identity.is_empty() {
        interceptors.push(Arc::new(IdentityInterceptor::new(registration.identity.clone())));
    }

    interceptors
}

fn data_source_interceptors(registration: &DataSourceRegistration) -> InterceptorInvocations {
    let mut interceptors = InterceptorInvocations::new();
    if registration.region.is_override_enabled {
        region_interceptors(registration.region, &mut interceptors);
        interceptors.push(Arc::new(SetRegionInState));
    }
    if let Some(tags) = &registration.tags {
        interceptors.push(Arc::new(DataSourceTagging::new(tags.clone())));
    }
    interceptors
}

fn ephemeral_interceptors(region: RegionSpec) -> InterceptorInvocations {
    let mut interceptors = InterceptorInvocations::new();
    if region.is_override_enabled {
        region_interceptors(region, &mut interceptors);
        interceptors.push(Arc::new(SetRegionInState));
    }
    interceptors
}

fn region_only_interceptors(region: RegionSpec) -> InterceptorInvocations {
    let mut interceptors = InterceptorInvocations::new();
    if region.is_override_enabled {
        region_interceptors(region, &mut interceptors);
    }
    interceptors
}

/// Multi-parameter identities resolve legacy IDs through a parser
fn needs_import_id_parser(identity: &IdentitySpec) -> bool {
    !identity.is_empty() && !identity.is_arn && !identity.is_singleton && identity.identity_attribute.is_none()
}

fn check_resource(registration: &ResourceRegistration, errors: &mut ConfigurationErrors) {
    let type_name = &registration.type_name;
    let import = &registration.import;
    let implements_import = registration.handler.implements_import();

    if import.wrapped_import && implements_import && !import.custom_import {
        errors.add(ConfigurationError::WrappedImportDefinesImport(type_name.clone()));
    }
    if import.custom_import && !implements_import {
        errors.add(ConfigurationError::CustomImportWithoutImport(type_name.clone()));
    }
    if import.wrapped_import && needs_import_id_parser(&registration.identity) && import.import_id.is_none() {
        errors.add(ConfigurationError::MissingImportIdParser(type_name.clone()));
    }
    if registration.identity.has_inherent_region && registration.identity.is_global_resource {
        errors.add(ConfigurationError::InherentRegionOnGlobal(type_name.clone()));
    }
}

/// Records `type_name` under `kind`, reporting it when already taken
fn check_unique(seen: &mut BTreeMap<&'static str, Vec<String>>, kind: &'static str, type_name: &str, errors: &mut ConfigurationErrors) -> bool {
    let names = seen.entry(kind).or_default();
    if names.iter().any(|n| n == type_name) {
        errors.add(ConfigurationError::Duplicate { kind, type_name: type_name.to_string() });
        return false;
    }
    names.push(type_name.to_string());
    true
}

fn check_region_attribute(schema: &Schema, region: RegionSpec, kind: &'static str, type_name: &str, errors: &mut ConfigurationErrors) {
    if region.is_override_enabled && schema.attribute(ATTR_REGION).is_some() {
        errors.add(ConfigurationError::RegionAttributeDefined { kind, type_name: type_name.to_string() });
    }
}

fn check_resource_tags(schema: &Schema, type_name: &str, errors: &mut ConfigurationErrors) {
    let type_name = type_name.to_string();
    match schema.attribute(ATTR_TAGS) {
        None => errors.add(ConfigurationError::MissingAttribute { attribute: ATTR_TAGS, kind: RESOURCE, type_name: type_name.clone() }),
        Some(tags) if tags.computed => {
            errors.add(ConfigurationError::AttributeComputed { attribute: ATTR_TAGS, kind: RESOURCE, type_name: type_name.clone() })
        }
        Some(_) => {}
    }
    match schema.attribute(ATTR_TAGS_ALL) {
        None => errors.add(ConfigurationError::MissingAttribute { attribute: ATTR_TAGS_ALL, kind: RESOURCE, type_name }),
        Some(tags_all) if !tags_all.computed => {
            errors.add(ConfigurationError::AttributeNotComputed { attribute: ATTR_TAGS_ALL, kind: RESOURCE, type_name })
        }
        Some(_) => {}
    }
}

fn check_data_source_tags(schema: &Schema, type_name: &str, errors: &mut ConfigurationErrors) {
    let type_name = type_name.to_string();
    match schema.attribute(ATTR_TAGS) {
        None => errors.add(ConfigurationError::MissingAttribute { attribute: ATTR_TAGS, kind: DATA_SOURCE, type_name }),
        Some(tags) if !tags.computed => {
            errors.add(ConfigurationError::AttributeNotComputed { attribute: ATTR_TAGS, kind: DATA_SOURCE, type_name })
        }
        Some(_) => {}
    }
}

/// Registrations of one service package, read once
struct Declared {
    service_package: String,
    resources: Vec<ResourceRegistration>,
    data_sources: Vec<DataSourceRegistration>,
    ephemeral_resources: Vec<EphemeralRegistration>,
    actions: Vec<ActionRegistration>,
    list_resources: Vec<ListResourceRegistration>,
}

impl Declared {
    fn from_definition(definition: &dyn ServicePackageDefinition) -> Self {
        Self {
            service_package: definition.name().to_string(),
            resources: definition.resources(),
            data_sources: definition.data_sources(),
            ephemeral_resources: definition.ephemeral_resources(),
            actions: definition.actions(),
            list_resources: definition.list_resources(),
        }
    }

    fn schema_context(&self, name: &str, type_name: &str) -> CallContext {
        CallContext::new(&self.service_package, name, type_name)
    }

    /// Checks every raw (uninstrumented) schema against the surface's options
    async fn validate_schemas(&self, errors: &mut ConfigurationErrors) {
        for r in &self.resources {
            let mut response = SchemaResponse::default();
            r.handler.schema(&self.schema_context(&r.name, &r.type_name), &SchemaRequest, &mut response).await;
            check_region_attribute(&response.schema, r.region, RESOURCE, &r.type_name, errors);
            if r.tags.is_some() {
                check_resource_tags(&response.schema, &r.type_name, errors);
            }
        }
        for d in &self.data_sources {
            let mut response = SchemaResponse::default();
            d.handler.schema(&self.schema_context(&d.name, &d.type_name), &SchemaRequest, &mut response).await;
            check_region_attribute(&response.schema, d.region, DATA_SOURCE, &d.type_name, errors);
            if d.tags.is_some() {
                check_data_source_tags(&response.schema, &d.type_name, errors);
            }
        }
        for e in &self.ephemeral_resources {
            let mut response = SchemaResponse::default();
            e.handler.schema(&self.schema_context(&e.name, &e.type_name), &SchemaRequest, &mut response).await;
            check_region_attribute(&response.schema, e.region, EPHEMERAL_RESOURCE, &e.type_name, errors);
        }
        for a in &self.actions {
            let mut response = SchemaResponse::default();
            a.handler.schema(&self.schema_context(&a.name, &a.type_name), &SchemaRequest, &mut response).await;
            check_region_attribute(&response.schema, a.region, ACTION, &a.type_name, errors);
        }
        for l in &self.list_resources {
            let mut response = SchemaResponse::default();
            l.handler.schema(&self.schema_context(&l.name, &l.type_name), &SchemaRequest, &mut response).await;
            check_region_attribute(&response.schema, l.region, LIST_RESOURCE, &l.type_name, errors);
        }
    }
}

/// Every dispatcher of the provider, keyed by type name
#[derive(Default)]
pub struct Provider {
    resources: BTreeMap<String, WrappedResource>,
    data_sources: BTreeMap<String, WrappedDataSource>,
    ephemeral_resources: BTreeMap<String, WrappedEphemeralResource>,
    actions: BTreeMap<String, WrappedAction>,
    list_resources: BTreeMap<String, WrappedListResource>,
}

impl Provider {
    /// Builds every dispatcher. Any inconsistent declaration fails the whole provider.
    pub async fn new(
        definitions: &[Arc<dyn ServicePackageDefinition>],
        guard: &SchemaValidationGuard,
    ) -> Result<Self, ConfigurationErrors> {
        let declared: Vec<Declared> = definitions.iter().map(|d| Declared::from_definition(d.as_ref())).collect();

        let packages = &declared;
        guard
            .validate_once(move || async move {
                let mut errors = ConfigurationErrors::new();
                for package in packages {
                    package.validate_schemas(&mut errors).await;
                }
                errors
            })
            .await?;

        let mut errors = ConfigurationErrors::new();
        let mut seen = BTreeMap::new();
        let mut provider = Provider::default();

        for package in declared {
            let sp = package.service_package.as_str();

            for r in package.resources {
                check_resource(&r, &mut errors);
                if !check_unique(&mut seen, RESOURCE, &r.type_name, &mut errors) {
                    continue;
                }
                let target = CallTarget::new(sp, &r.name, &r.type_name)
                    .with_region_override(r.region.is_override_enabled)
                    .with_tags(r.tags.is_some());
                let interceptors = resource_interceptors(&r);
                log::debug!("{}: {}", r.type_name, interceptors.names().join(", "));
                let wrapped = WrappedResource::new(r.handler, target, interceptors, r.identity, r.import);
                provider.resources.insert(r.type_name, wrapped);
            }

            for d in package.data_sources {
                if !check_unique(&mut seen, DATA_SOURCE, &d.type_name, &mut errors) {
                    continue;
                }
                let target = CallTarget::new(sp, &d.name, &d.type_name)
                    .with_region_override(d.region.is_override_enabled)
                    .with_tags(d.tags.is_some());
                let interceptors = data_source_interceptors(&d);
                provider.data_sources.insert(d.type_name, WrappedDataSource::new(d.handler, target, interceptors));
            }

            for e in package.ephemeral_resources {
                if !check_unique(&mut seen, EPHEMERAL_RESOURCE, &e.type_name, &mut errors) {
                    continue;
                }
                let target = CallTarget::new(sp, &e.name, &e.type_name).with_region_override(e.region.is_override_enabled);
                let interceptors = ephemeral_interceptors(e.region);
                provider
                    .ephemeral_resources
                    .insert(e.type_name, WrappedEphemeralResource::new(e.handler, target, interceptors));
            }

            for a in package.actions {
                if !check_unique(&mut seen, ACTION, &a.type_name, &mut errors) {
                    continue;
                }
                let target = CallTarget::new(sp, &a.name, &a.type_name).with_region_override(a.region.is_override_enabled);
                let interceptors = region_only_interceptors(a.region);
                provider.actions.insert(a.type_name, WrappedAction::new(a.handler, target, interceptors));
            }

            for l in package.list_resources {
                if !check_unique(&mut seen, LIST_RESOURCE, &l.type_name, &mut errors) {
                    continue;
                }
                let target = CallTarget::new(sp, &l.name, &l.type_name).with_region_override(l.region.is_override_enabled);
                let interceptors = region_only_interceptors(l.region);
                provider.list_resources.insert(l.type_name, WrappedListResource::new(l.handler, target, interceptors));
            }
        }

        errors.into_result(provider)
    }

    /// Hands the client to every dispatcher
    pub async fn configure(&self, client: Arc<dyn AwsClient>) -> Diagnostics {
        let mut diags = Diagnostics::new();

        let request = || ConfigureRequest { client: Some(client.clone()) };
        for wrapped in self.resources.values() {
            let mut response = ConfigureResponse::default();
            wrapped.configure(request(), &mut response).await;
            diags.append(response.diagnostics);
        }
        for wrapped in self.data_sources.values() {
            let mut response = ConfigureResponse::default();
            wrapped.configure(request(), &mut response).await;
            diags.append(response.diagnostics);
        }
        for wrapped in self.ephemeral_resources.values() {
            let mut response = ConfigureResponse::default();
            wrapped.configure(request(), &mut response).await;
            diags.append(response.diagnostics);
        }
        for wrapped in self.actions.values() {
            let mut response = ConfigureResponse::default();
            wrapped.configure(request(), &mut response).await;
            diags.append(response.diagnostics);
        }
        for wrapped in self.list_resources.values() {
            let mut response = ConfigureResponse::default();
            wrapped.configure(request(), &mut response).await;
            diags.append(response.diagnostics);
        }

        diags
    }

    pub fn resource(&self, type_name: &str) -> Option<&WrappedResource> {
        self.resources.get(type_name)
    }

    pub fn data_source(&self, type_name: &str) -> Option<&WrappedDataSource> {
        self.data_sources.get(type_name)
    }

    pub fn ephemeral_resource(&self, type_name: &str) -> Option<&WrappedEphemeralResource> {
        self.ephemeral_resources.get(type_name)
    }

    pub fn action(&self, type_name: &str) -> Option<&WrappedAction> {
        self.actions.get(type_name)
    }

    pub fn list_resource(&self, type_name: &str) -> Option<&WrappedListResource> {
        self.list_resources.get(type_name)
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }
}
