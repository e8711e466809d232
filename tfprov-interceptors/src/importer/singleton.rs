use tfprov_core::client::AwsClient;
use tfprov_core::context::CallContext;
use tfprov_core::identity::IdentitySpec;
use tfprov_core::names::ATTR_REGION;
use tfprov_core::protocol::{ImportStateRequest, ImportStateResponse};
use super::*;

pub const INVALID_IMPORT_ID: &str = "Invalid Import ID";

fn set_duplicates(identity_spec: &IdentitySpec, state: &mut Object, value: &str) {
    for duplicate in &identity_spec.identity_duplicate_attrs {
        state.set(duplicate.as_str(), value);
    }
}

/// One instance per account and region; the import ID is the region itself
pub fn regional_singleton(
    client: &dyn AwsClient,
    ctx: &CallContext,
    identity_spec: &IdentitySpec,
    request: &ImportStateRequest,
    response: &mut ImportStateResponse,
) {
    let region = match request_identity(request) {
        None => {
            let region = response.state.get_string(ATTR_REGION).unwrap_or_default().to_string();
            if request.id != region {
                response.diagnostics.add_error(
                    INVALID_IMPORT_ID,
                    format!("for this resource type the import ID must be the region \"{}\", got \"{}\"", region, request.id),
                );
                return;
            }
            region
        }
        Some(identity) => {
            if !validate_account_id(client, ctx, identity, &mut response.diagnostics) {
                return;
            }
            set_region_from_identity(client, ctx, identity, &mut response.state)
        }
    };
    set_duplicates(identity_spec, &mut response.state, &region);
}

/// One instance per account.
///
/// Unlike the regional variant the import ID is not checked: any value is accepted.
pub fn global_singleton(
    client: &dyn AwsClient,
    ctx: &CallContext,
    identity_spec: &IdentitySpec,
    request: &ImportStateRequest,
    response: &mut ImportStateResponse,
) {
    if let Some(identity) = request_identity(request) {
        if !validate_account_id(client, ctx, identity, &mut response.diagnostics) {
            return;
        }
    }
    set_duplicates(identity_spec, &mut response.state, &client.account_id(ctx));
}
