use tfprov_core::client::AwsClient;
use tfprov_core::context::CallContext;
use tfprov_core::diag::Diagnostic;
use tfprov_core::identity::{IdentitySpec, ImportSpec};
use tfprov_core::names::ATTR_ID;
use tfprov_core::protocol::{ImportStateRequest, ImportStateResponse};
use super::*;

pub const MISSING_IMPORT_ID_PARSER: &str = "Missing Import ID Parser";

/// One identifying parameter, e.g. a name. Regional and global resources differ only in
/// `region`, which is already in state for an import by ID.
pub fn single_parameter(
    client: &dyn AwsClient,
    ctx: &CallContext,
    identity_spec: &IdentitySpec,
    request: &ImportStateRequest,
    response: &mut ImportStateResponse,
) {
    let Some(name) = identity_spec.identity_attribute.as_deref() else {
        return;
    };

    let Some(identity) = request_identity(request) else {
        set_primary(identity_spec, &mut response.state, name, &request.id);
        return;
    };

    if !validate_account_id(client, ctx, identity, &mut response.diagnostics) {
        return;
    }
    if !identity_spec.is_global_resource {
        set_region_from_identity(client, ctx, identity, &mut response.state);
    }
    if let Some(value) = required_identity_value(identity, name, &mut response.diagnostics) {
        set_primary(identity_spec, &mut response.state, name, value);
    }
}

/// Several identifying parameters, e.g. a name and a type, joined in the legacy import ID
pub fn multiple_parameters(
    client: &dyn AwsClient,
    ctx: &CallContext,
    identity_spec: &IdentitySpec,
    import_spec: &ImportSpec,
    request: &ImportStateRequest,
    response: &mut ImportStateResponse,
) {
    let Some(parser) = import_spec.import_id.as_deref() else {
        response.diagnostics.add_error(
            MISSING_IMPORT_ID_PARSER,
            format!("resource type {} has no import ID parser", ctx.type_name),
        );
        return;
    };

    let Some(identity) = request_identity(request) else {
        let (id, attrs) = match parser.parse(&request.id) {
            Ok(parsed) => parsed,
            Err(e) => {
                response.diagnostics.push(Diagnostic::from(e));
                return;
            }
        };
        for (name, value) in &attrs {
            response.state.set(name.as_str(), value.as_str());
        }
        if import_spec.set_id_attr {
            response.state.set(ATTR_ID, id);
        }
        return;
    };

    if !validate_account_id(client, ctx, identity, &mut response.diagnostics) {
        return;
    }
    if !identity_spec.is_global_resource {
        set_region_from_identity(client, ctx, identity, &mut response.state);
    }
    for attribute in identity_spec.parameters() {
        match identity.get(&attribute.name) {
            Some(value) => response.state.set(attribute.resource_attribute_name.as_str(), value),
            None if attribute.required => {
                required_identity_value(identity, &attribute.name, &mut response.diagnostics);
            }
            None => {}
        }
    }
    if response.diagnostics.has_error() || !import_spec.set_id_attr {
        return;
    }

    match parser.creator() {
        Some(creator) => {
            let id = creator.create(&response.state);
            response.state.set(ATTR_ID, id);
        }
        None => response.diagnostics.add_error(
            MISSING_IMPORT_ID_PARSER,
            format!("resource type {} sets `id` on import but its import ID parser cannot create IDs", ctx.type_name),
        ),
    }
}
