//! Generic import for resources declaring an identity.
//!
//! An import request carries either a legacy string ID or a structured identity. Each
//! resolver turns either form into state attributes and, when the host expects one,
//! an identity. By the time a resolver runs, the `region` interceptor has already
//! canonicalized the ID and set the state's region.

use tfprov_core::client::AwsClient;
use tfprov_core::context::CallContext;
use tfprov_core::diag::{Diagnostic, Diagnostics};
use tfprov_core::identity::{IdentitySpec, ImportSpec};
use tfprov_core::names::{ATTR_ACCOUNT_ID, ATTR_REGION};
use tfprov_core::protocol::{ImportStateRequest, ImportStateResponse};
use tfprov_core::types::{Identity, Object};

pub mod arn;
pub mod parameterized;
pub mod singleton;

pub const INVALID_ACCOUNT_ID: &str = "Invalid Account ID";
pub const MISSING_IDENTITY_ATTRIBUTE: &str = "Missing Identity Attribute";

/// Picks the resolver matching the identity's shape and runs it
pub fn import_state(
    client: &dyn AwsClient,
    ctx: &CallContext,
    identity_spec: &IdentitySpec,
    import_spec: &ImportSpec,
    request: &ImportStateRequest,
    response: &mut ImportStateResponse,
) {
    let global = identity_spec.is_global_resource;
    match (identity_spec.is_arn, identity_spec.is_singleton, identity_spec.identity_attribute.is_some()) {
        (true, _, _) if global => arn::global_arn(client, ctx, identity_spec, request, response),
        (true, _, _) => arn::regional_arn(client, ctx, identity_spec, request, response),
        (_, true, _) if global => singleton::global_singleton(client, ctx, identity_spec, request, response),
        (_, true, _) => singleton::regional_singleton(client, ctx, identity_spec, request, response),
        (_, _, true) => parameterized::single_parameter(client, ctx, identity_spec, request, response),
        _ => parameterized::multiple_parameters(client, ctx, identity_spec, import_spec, request, response),
    }

    if response.diagnostics.has_error() {
        return;
    }
    if let Some(identity) = response.identity.as_mut() {
        identity_spec.populate(client, ctx, &response.state, identity);
    }
}

/// Identity of an import-by-identity request; `None` for an import by ID
pub(crate) fn request_identity(request: &ImportStateRequest) -> Option<&Identity> {
    if !request.id.is_empty() {
        return None;
    }
    request.identity.as_ref()
}

/// An identity may only name the account the provider is configured for
pub(crate) fn validate_account_id(client: &dyn AwsClient, ctx: &CallContext, identity: &Identity, diags: &mut Diagnostics) -> bool {
    let Some(account_id) = identity.get(ATTR_ACCOUNT_ID) else {
        return true;
    };
    let configured = client.account_id(ctx);
    if account_id == configured {
        return true;
    }
    log::debug!("[{}] {}: import account {} does not match {}", ctx.call_id, ctx.type_name, account_id, configured);
    diags.push(Diagnostic::error(
        INVALID_ACCOUNT_ID,
        format!(
            "Provider configured with Account ID \"{}\" cannot be used to import resources from account \"{}\"",
            configured, account_id
        ),
    ));
    false
}

/// Region of an identity import: the identity's own, else the in-context region
pub(crate) fn set_region_from_identity(client: &dyn AwsClient, ctx: &CallContext, identity: &Identity, state: &mut Object) -> String {
    let region = identity
        .get(ATTR_REGION)
        .map(str::to_string)
        .unwrap_or_else(|| client.region(ctx));
    state.set(ATTR_REGION, region.clone());
    region
}

/// Required identity attribute, or an error diagnostic
pub(crate) fn required_identity_value<'a>(identity: &'a Identity, name: &str, diags: &mut Diagnostics) -> Option<&'a str> {
    let value = identity.get(name);
    if value.is_none() {
        diags.add_error(MISSING_IDENTITY_ATTRIBUTE, format!("identity attribute \"{}\" is required", name));
    }
    value
}

/// Sets the primary attribute and every attribute mirroring it
pub(crate) fn set_primary(identity_spec: &IdentitySpec, state: &mut Object, name: &str, value: &str) {
    let attribute = identity_spec
        .attributes
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.resource_attribute_name.as_str())
        .unwrap_or(name);
    state.set(attribute, value);
    for duplicate in &identity_spec.identity_duplicate_attrs {
        state.set(duplicate.as_str(), value);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;
    use tfprov_core::client::{ProviderClient, ProviderConfig};
    use tfprov_core::error::{ProviderError, ProviderResult};
    use tfprov_core::identity::{ImportIdCreator, ImportIdParser};
    use tfprov_core::types::Object;
    use super::*;

    pub const ACCOUNT_ID: &str = "123456789012";
    pub const REGION: &str = "a-region-1";
    pub const ANOTHER_REGION: &str = "another-region-1";

    pub fn client() -> ProviderClient {
        ProviderClient::new(ProviderConfig {
            account_id: ACCOUNT_ID.into(),
            region: REGION.into(),
            ..Default::default()
        })
    }

    pub fn ctx() -> CallContext {
        CallContext::new("svc", "Thing", "aws_thing")
    }

    /// Identity from string pairs
    pub fn identity(pairs: &[(&str, &str)]) -> Identity {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    /// Import-by-ID response with the region the region interceptor would have set
    pub fn by_id(id: &str, region: Option<&str>, with_identity: bool) -> (ImportStateRequest, ImportStateResponse) {
        let mut state = Object::new();
        if let Some(region) = region {
            state.set(ATTR_REGION, region);
        }
        let request = ImportStateRequest { id: id.into(), identity: None };
        let response = ImportStateResponse {
            state,
            identity: with_identity.then(Identity::new),
            ..Default::default()
        };
        (request, response)
    }

    pub fn by_identity(identity: Identity) -> (ImportStateRequest, ImportStateResponse) {
        let request = ImportStateRequest { id: String::new(), identity: Some(identity) };
        let response = ImportStateResponse { identity: Some(Identity::new()), ..Default::default() };
        (request, response)
    }

    pub fn attr<'a>(state: &'a Object, name: &str) -> &'a str {
        state.get_string(name).unwrap_or_default()
    }

    /// `name,type` IDs, optionally prefixed with `trim:`
    pub struct TestImportId;

    impl ImportIdParser for TestImportId {
        fn parse(&self, id: &str) -> ProviderResult<(String, BTreeMap<String, String>)> {
            if id == "invalid" {
                return Err(ProviderError::invalid_import_id(id, "invalid ID"));
            }
            let id = id.strip_prefix("trim:").unwrap_or(id);
            let Some((name, ty)) = id.split_once(',') else {
                return Err(ProviderError::invalid_import_id(id, "expected name,type"));
            };
            let attrs = [("name".to_string(), name.to_string()), ("type".to_string(), ty.to_string())];
            Ok((id.to_string(), attrs.into_iter().collect()))
        }
    }

    pub struct TestImportIdCreator;

    impl ImportIdParser for TestImportIdCreator {
        fn parse(&self, id: &str) -> ProviderResult<(String, BTreeMap<String, String>)> {
            TestImportId.parse(id)
        }

        fn creator(&self) -> Option<&dyn ImportIdCreator> {
            Some(self)
        }
    }

    impl ImportIdCreator for TestImportIdCreator {
        fn create(&self, state: &Object) -> String {
            format!("{},{}", attr(state, "name"), attr(state, "type"))
        }
    }
}
