use std::fmt;
use tfprov_core::client::AwsClient;
use tfprov_core::context::CallContext;
use tfprov_core::diag::Diagnostic;
use tfprov_core::error::{ProviderError, ProviderResult};
use tfprov_core::identity::IdentitySpec;
use tfprov_core::names::{ATTR_ARN, ATTR_REGION};
use tfprov_core::protocol::{ImportStateRequest, ImportStateResponse};
use tfprov_core::types::AttributePath;
use super::*;

pub const INVALID_REGION: &str = "Invalid Region Value";

/// `arn:partition:service:region:account-id:resource`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl Arn {
    pub fn parse(arn: &str) -> ProviderResult<Self> {
        let parts: Vec<&str> = arn.splitn(6, ':').collect();
        let [prefix, partition, service, region, account_id, resource] = parts.as_slice() else {
            return Err(ProviderError::invalid_arn(arn, "not enough sections"));
        };
        if *prefix != "arn" {
            return Err(ProviderError::invalid_arn(arn, "prefix is not \"arn\""));
        }
        if partition.is_empty() {
            return Err(ProviderError::invalid_arn(arn, "missing partition"));
        }
        if service.is_empty() {
            return Err(ProviderError::invalid_arn(arn, "missing service"));
        }
        if resource.is_empty() {
            return Err(ProviderError::invalid_arn(arn, "missing resource"));
        }
        Ok(Self {
            partition: partition.to_string(),
            service: service.to_string(),
            region: region.to_string(),
            account_id: account_id.to_string(),
            resource: resource.to_string(),
        })
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

fn arn_value<'a>(identity_spec: &IdentitySpec, request: &'a ImportStateRequest, response: &mut ImportStateResponse) -> Option<&'a str> {
    match request_identity(request) {
        None => Some(request.id.as_str()),
        Some(identity) => {
            let name = identity_spec.identity_attribute.as_deref().unwrap_or(ATTR_ARN);
            required_identity_value(identity, name, &mut response.diagnostics)
        }
    }
}

fn parse(value: &str, response: &mut ImportStateResponse) -> Option<Arn> {
    match Arn::parse(value) {
        Ok(arn) => Some(arn),
        Err(e) => {
            response.diagnostics.push(Diagnostic::from(e));
            None
        }
    }
}

/// ARN of a regional resource. The region is the ARN's; a region already chosen for the
/// import, from an `@region` ID suffix, must agree with it.
pub fn regional_arn(
    _client: &dyn AwsClient,
    ctx: &CallContext,
    identity_spec: &IdentitySpec,
    request: &ImportStateRequest,
    response: &mut ImportStateResponse,
) {
    let Some(value) = arn_value(identity_spec, request, response) else {
        return;
    };
    let Some(arn) = parse(value, response) else {
        return;
    };

    if let Some(region) = response.state.get_string(ATTR_REGION).filter(|r| !r.is_empty()) {
        if region != arn.region {
            log::debug!("[{}] {}: import region {} conflicts with ARN {}", ctx.call_id, ctx.type_name, region, arn);
            response.diagnostics.add_attribute_error(
                AttributePath::root(ATTR_REGION),
                INVALID_REGION,
                format!("the region passed for import, \"{}\", does not match the region \"{}\" in the ARN \"{}\"", region, arn.region, arn),
            );
            return;
        }
    }

    response.state.set(ATTR_REGION, arn.region.as_str());
    let name = identity_spec.identity_attribute.as_deref().unwrap_or(ATTR_ARN);
    set_primary(identity_spec, &mut response.state, name, value);
}

/// ARN of a global resource; there is no region to reconcile
pub fn global_arn(
    _client: &dyn AwsClient,
    _ctx: &CallContext,
    identity_spec: &IdentitySpec,
    request: &ImportStateRequest,
    response: &mut ImportStateResponse,
) {
    let Some(value) = arn_value(identity_spec, request, response) else {
        return;
    };
    if parse(value, response).is_none() {
        return;
    }
    let name = identity_spec.identity_attribute.as_deref().unwrap_or(ATTR_ARN);
    set_primary(identity_spec, &mut response.state, name, value);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tfprov_core::identity::ImportSpec;
    use super::super::testing::*;
    use super::super::import_state;
    use super::*;

    const REGIONAL_ARN: &str = "arn:aws:svc:a-region-1:123456789012:thing/a_name";
    const GLOBAL_ARN: &str = "arn:aws:iam::123456789012:role/a_role";

    #[test]
    fn parse_arn() {
        let arn = Arn::parse("arn:aws:s3:::bucket/key:with:colons");
        assert_eq!(
            arn,
            Ok(Arn {
                partition: "aws".into(),
                service: "s3".into(),
                region: String::new(),
                account_id: String::new(),
                resource: "bucket/key:with:colons".into(),
            })
        );
        assert_eq!(arn.map(|a| a.to_string()), Ok("arn:aws:s3:::bucket/key:with:colons".to_string()));

        assert!(Arn::parse("not-an-arn").is_err());
        assert!(Arn::parse("arx:aws:s3:::bucket").is_err());
        assert!(Arn::parse("arn:aws:s3:::").is_err());
    }

    #[test]
    fn regional_by_import_id() {
        let client = client();
        let spec = IdentitySpec::regional_arn("arn").with_duplicate_attrs(["id"]);
        let (request, mut response) = by_id(REGIONAL_ARN, None, true);

        import_state(&client, &ctx(), &spec, &ImportSpec::wrapped(), &request, &mut response);

        assert!(!response.diagnostics.has_error());
        assert_eq!(attr(&response.state, "arn"), REGIONAL_ARN);
        assert_eq!(attr(&response.state, "id"), REGIONAL_ARN);
        assert_eq!(attr(&response.state, ATTR_REGION), REGION);
    }

    #[test]
    fn regional_import_region_must_match_arn() {
        let client = client();
        let spec = IdentitySpec::regional_arn("arn");

        let (request, mut response) = by_id(REGIONAL_ARN, Some(REGION), true);
        import_state(&client, &ctx(), &spec, &ImportSpec::wrapped(), &request, &mut response);
        assert!(!response.diagnostics.has_error());

        let (request, mut response) = by_id(REGIONAL_ARN, Some(ANOTHER_REGION), true);
        import_state(&client, &ctx(), &spec, &ImportSpec::wrapped(), &request, &mut response);
        assert_eq!(response.diagnostics.summaries(), vec![INVALID_REGION]);
        assert_eq!(response.identity, Some(Identity::new()));
    }

    #[test]
    fn regional_by_identity() {
        let client = client();
        let spec = IdentitySpec::regional_arn("arn");
        let arn = "arn:aws:svc:another-region-1:123456789012:thing/a_name";
        let (request, mut response) = by_identity(identity(&[("arn", arn)]));

        import_state(&client, &ctx(), &spec, &ImportSpec::wrapped(), &request, &mut response);

        assert!(!response.diagnostics.has_error());
        assert_eq!(attr(&response.state, ATTR_REGION), ANOTHER_REGION);
        assert_eq!(response.identity, Some(identity(&[("arn", arn)])));
    }

    #[test]
    fn global_by_import_id() {
        let client = client();
        let spec = IdentitySpec::global_arn("arn");
        let (request, mut response) = by_id(GLOBAL_ARN, None, false);

        import_state(&client, &ctx(), &spec, &ImportSpec::wrapped(), &request, &mut response);

        assert!(!response.diagnostics.has_error());
        assert_eq!(attr(&response.state, "arn"), GLOBAL_ARN);
        assert!(!response.state.contains(ATTR_REGION));
    }

    #[test]
    fn malformed_arn() {
        let client = client();
        let spec = IdentitySpec::global_arn("arn");
        let (request, mut response) = by_id("role/a_role", None, false);

        import_state(&client, &ctx(), &spec, &ImportSpec::wrapped(), &request, &mut response);

        assert_eq!(response.diagnostics.summaries(), vec!["Invalid ARN"]);
    }
}
