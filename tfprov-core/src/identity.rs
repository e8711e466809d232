use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use crate::client::AwsClient;
use crate::context::CallContext;
use crate::error::ProviderResult;
use crate::names::{ATTR_ACCOUNT_ID, ATTR_REGION};
use crate::types::{Identity, Object};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAttribute {
    pub name: String,
    /// State attribute the value is read from; usually the same as `name`
    pub resource_attribute_name: String,
    pub required: bool,
}

impl IdentityAttribute {
    pub fn string(name: impl Into<String>, required: bool) -> Self {
        let name = name.into();
        Self {
            resource_attribute_name: name.clone(),
            name,
            required,
        }
    }

    pub fn mapped(name: impl Into<String>, resource_attribute_name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            resource_attribute_name: resource_attribute_name.into(),
            required,
        }
    }

    fn account_id() -> Self {
        Self::string(ATTR_ACCOUNT_ID, false)
    }

    fn region() -> Self {
        Self::string(ATTR_REGION, false)
    }
}

/// Declarative identity metadata of one resource type.
///
/// Built once at registration from static tables and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentitySpec {
    pub attributes: Vec<IdentityAttribute>,
    /// Primary parameter of single-parameter and ARN identities
    pub identity_attribute: Option<String>,
    pub is_global_resource: bool,
    pub is_singleton: bool,
    pub is_arn: bool,
    /// Region is derived from the identity itself (an ARN), never defaulted
    pub has_inherent_region: bool,
    pub is_mutable: bool,
    /// State attributes that mirror the primary identity attribute, typically `id`
    pub identity_duplicate_attrs: Vec<String>,
}

impl IdentitySpec {
    pub fn regional_single_parameter(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            attributes: vec![
                IdentityAttribute::account_id(),
                IdentityAttribute::region(),
                IdentityAttribute::string(name.clone(), true),
            ],
            identity_attribute: Some(name),
            ..Default::default()
        }
    }

    pub fn global_single_parameter(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            attributes: vec![
                IdentityAttribute::account_id(),
                IdentityAttribute::string(name.clone(), true),
            ],
            identity_attribute: Some(name),
            is_global_resource: true,
            ..Default::default()
        }
    }

    pub fn regional_parameterized(attributes: Vec<IdentityAttribute>) -> Self {
        let mut all = vec![IdentityAttribute::account_id(), IdentityAttribute::region()];
        all.extend(attributes);
        Self {
            attributes: all,
            ..Default::default()
        }
    }

    pub fn global_parameterized(attributes: Vec<IdentityAttribute>) -> Self {
        let mut all = vec![IdentityAttribute::account_id()];
        all.extend(attributes);
        Self {
            attributes: all,
            is_global_resource: true,
            ..Default::default()
        }
    }

    pub fn regional_arn(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            attributes: vec![IdentityAttribute::string(name.clone(), true)],
            identity_attribute: Some(name),
            is_arn: true,
            has_inherent_region: true,
            ..Default::default()
        }
    }

    pub fn global_arn(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            attributes: vec![IdentityAttribute::string(name.clone(), true)],
            identity_attribute: Some(name),
            is_arn: true,
            is_global_resource: true,
            ..Default::default()
        }
    }

    pub fn regional_singleton() -> Self {
        Self {
            attributes: vec![IdentityAttribute::account_id(), IdentityAttribute::region()],
            is_singleton: true,
            ..Default::default()
        }
    }

    pub fn global_singleton() -> Self {
        Self {
            attributes: vec![IdentityAttribute::account_id()],
            is_singleton: true,
            is_global_resource: true,
            ..Default::default()
        }
    }

    pub fn with_mutable(mut self) -> Self {
        self.is_mutable = true;
        self
    }

    pub fn with_duplicate_attrs(mut self, attrs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.identity_duplicate_attrs = attrs.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Attributes other than the well-known account ID and region
    pub fn parameters(&self) -> impl Iterator<Item = &IdentityAttribute> {
        self.attributes
            .iter()
            .filter(|a| a.name != ATTR_ACCOUNT_ID && a.name != ATTR_REGION)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    /// Fills `identity` from well-known values and the resource's state.
    ///
    /// `account_id` comes from the client. `region` is the state's region when it has one,
    /// otherwise the in-context region. Everything else is read from the mapped state attribute.
    pub fn populate(&self, client: &dyn AwsClient, ctx: &CallContext, state: &Object, identity: &mut Identity) {
        for attribute in &self.attributes {
            match attribute.name.as_str() {
                ATTR_ACCOUNT_ID => identity.set(ATTR_ACCOUNT_ID, client.account_id(ctx)),
                ATTR_REGION => {
                    let region = state
                        .get_string(ATTR_REGION)
                        .map(str::to_string)
                        .unwrap_or_else(|| client.region(ctx));
                    identity.set(ATTR_REGION, region)
                }
                _ => identity.set(
                    attribute.name.clone(),
                    state.get_string(&attribute.resource_attribute_name).unwrap_or_default(),
                ),
            }
        }
    }
}

/// Parses a legacy import ID into its canonical form and parameter values
pub trait ImportIdParser: Send + Sync {
    fn parse(&self, id: &str) -> ProviderResult<(String, BTreeMap<String, String>)>;

    /// Parsers that can also build an ID back from state expose it here
    fn creator(&self) -> Option<&dyn ImportIdCreator> {
        None
    }
}

pub trait ImportIdCreator: Send + Sync {
    fn create(&self, state: &Object) -> String;
}

/// How a resource type imports existing infrastructure
#[derive(Clone, Default)]
pub struct ImportSpec {
    /// Import is handled by the generic resolvers
    pub wrapped_import: bool,
    /// The resource's own import function runs after generic handling
    pub custom_import: bool,
    pub import_id: Option<Arc<dyn ImportIdParser>>,
    /// Also set the `id` attribute from the canonical import ID
    pub set_id_attr: bool,
}

impl ImportSpec {
    pub fn wrapped() -> Self {
        Self { wrapped_import: true, ..Default::default() }
    }

    pub fn with_import_id(mut self, parser: Arc<dyn ImportIdParser>) -> Self {
        self.import_id = Some(parser);
        self
    }

    pub fn with_set_id_attr(mut self) -> Self {
        self.set_id_attr = true;
        self
    }
}

impl fmt::Debug for ImportSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportSpec")
            .field("wrapped_import", &self.wrapped_import)
            .field("custom_import", &self.custom_import)
            .field("import_id", &self.import_id.is_some())
            .field("set_id_attr", &self.set_id_attr)
            .finish()
    }
}
