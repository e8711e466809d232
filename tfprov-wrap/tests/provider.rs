mod support;

use std::sync::Arc;
use pretty_assertions::assert_eq;
use support::*;
use tfprov_core::error::{ConfigurationError, ConfigurationErrors};
use tfprov_core::identity::{IdentityAttribute, IdentitySpec, ImportSpec};
use tfprov_core::types::{Attribute, AttributeType, Schema};
use tfprov_interceptors::TagsSpec;
use tfprov_wrap::*;

fn thing(calls: &Calls) -> ResourceRegistration {
    ResourceRegistration::new("aws_thing", "Thing", Arc::new(Things::new(calls)))
}

async fn build(package: Package) -> Result<Provider, ConfigurationErrors> {
    Provider::new(&definitions(package), &SchemaValidationGuard::new()).await
}

fn errors(result: Result<Provider, ConfigurationErrors>) -> Vec<ConfigurationError> {
    result.err().map(|e| e.errors).unwrap_or_default()
}

#[tokio::test]
async fn resource_interceptor_order() {
    let calls = Calls::default();
    let registration = thing(&calls)
        .with_region(RegionSpec::enabled())
        .with_tags(TagsSpec::new("arn"))
        .with_identity(IdentitySpec::regional_single_parameter("name"));
    let provider = build(Package { resources: vec![registration], ..Default::default() }).await.unwrap();

    let names = provider.resource("aws_thing").unwrap().interceptors().names();

    assert_eq!(
        names,
        vec![
            "InjectRegionAttribute",
            "ValidateRegion",
            "DefaultRegion",
            "SetRegionInState",
            "ForceNewIfRegionChanges",
            "ImportRegion",
            "TransparentTagging",
            "SetTagsAll",
            "ValidateRequiredTags",
            "Identity",
        ]
    );
}

#[tokio::test]
async fn inherent_region_skips_import_default() {
    let calls = Calls::default();
    let registration = thing(&calls)
        .with_region(RegionSpec { is_override_enabled: true, is_validate_override_in_partition: false })
        .with_identity(IdentitySpec::regional_arn("arn"))
        .with_import(ImportSpec::wrapped());
    let provider = build(Package { resources: vec![registration], ..Default::default() }).await.unwrap();

    let names = provider.resource("aws_thing").unwrap().interceptors().names();

    assert_eq!(
        names,
        vec![
            "InjectRegionAttribute",
            "DefaultRegion",
            "SetRegionInState",
            "ForceNewIfRegionChanges",
            "ImportRegionNoDefault",
            "Identity",
        ]
    );
}

#[tokio::test]
async fn other_surfaces_get_region_and_tags() {
    let calls = Calls::default();
    let lister: Arc<dyn ListResourceHandler> = Arc::new(ThingLister { calls: calls.clone(), count: 0 });
    let package = Package {
        list_resources: vec![ListResourceRegistration::new("aws_thing", "Thing", lister).with_region(RegionSpec::enabled())],
        ..Default::default()
    };
    let provider = build(package).await.unwrap();

    let names = provider.list_resource("aws_thing").unwrap().interceptors().names();

    assert_eq!(names, vec!["InjectRegionAttribute", "ValidateRegion"]);
    assert!(provider.resource("aws_thing").is_none());
}

#[tokio::test]
async fn duplicates_are_reported_per_kind() {
    let calls = Calls::default();
    let package = Package { resources: vec![thing(&calls), thing(&calls)], ..Default::default() };

    assert_eq!(
        errors(build(package).await),
        vec![ConfigurationError::Duplicate { kind: "resource", type_name: "aws_thing".into() }]
    );
}

#[tokio::test]
async fn import_declarations_must_be_consistent() {
    let calls = Calls::default();
    let own = || Arc::new(Things::new(&calls).with_own_import());
    let package = Package {
        resources: vec![
            ResourceRegistration::new("aws_wrapped_own", "A", own()).with_import(ImportSpec::wrapped()),
            ResourceRegistration::new("aws_custom", "B", Arc::new(Things::new(&calls)))
                .with_import(ImportSpec { custom_import: true, ..Default::default() }),
            ResourceRegistration::new("aws_no_parser", "C", Arc::new(Things::new(&calls)))
                .with_identity(IdentitySpec::regional_parameterized(vec![
                    IdentityAttribute::string("name", true),
                    IdentityAttribute::string("type", true),
                ]))
                .with_import(ImportSpec::wrapped()),
            ResourceRegistration::new("aws_custom_ok", "D", own())
                .with_import(ImportSpec { wrapped_import: true, custom_import: true, ..Default::default() }),
        ],
        ..Default::default()
    };

    assert_eq!(
        errors(build(package).await),
        vec![
            ConfigurationError::WrappedImportDefinesImport("aws_wrapped_own".into()),
            ConfigurationError::CustomImportWithoutImport("aws_custom".into()),
            ConfigurationError::MissingImportIdParser("aws_no_parser".into()),
        ]
    );
}

#[tokio::test]
async fn inherent_region_on_global_resource() {
    let calls = Calls::default();
    let mut identity = IdentitySpec::global_arn("arn");
    identity.has_inherent_region = true;
    let package = Package { resources: vec![thing(&calls).with_identity(identity)], ..Default::default() };

    assert_eq!(
        errors(build(package).await),
        vec![ConfigurationError::InherentRegionOnGlobal("aws_thing".into())]
    );
}

#[tokio::test]
async fn schema_validation() {
    let calls = Calls::default();
    let with_region = tagged_schema().with_attribute("region", Attribute::optional(AttributeType::String));
    let bad_tags = Schema::new()
        .with_attribute("tags", Attribute::optional_computed(AttributeType::StringMap))
        .with_attribute("tags_all", Attribute::optional(AttributeType::StringMap));
    let package = Package {
        resources: vec![
            ResourceRegistration::new("aws_region", "A", Arc::new(Things::new(&calls).with_schema(with_region)))
                .with_region(RegionSpec::enabled()),
            ResourceRegistration::new("aws_bad_tags", "B", Arc::new(Things::new(&calls).with_schema(bad_tags)))
                .with_tags(TagsSpec::new("arn")),
            ResourceRegistration::new("aws_no_tags", "C", Arc::new(Things::new(&calls).with_schema(Schema::new())))
                .with_tags(TagsSpec::new("arn")),
        ],
        ..Default::default()
    };

    let result = build(package).await;
    let messages: Vec<String> = errors(result).iter().map(ToString::to_string).collect();

    assert_eq!(
        messages,
        vec![
            "`region` attribute is defined: aws_region resource",
            "`tags` attribute cannot be Computed: aws_bad_tags resource",
            "`tags_all` attribute must be Computed: aws_bad_tags resource",
            "no `tags` attribute defined in schema: aws_no_tags resource",
            "no `tags_all` attribute defined in schema: aws_no_tags resource",
        ]
    );
}

#[tokio::test]
async fn schemas_are_validated_once_per_guard() {
    let calls = Calls::default();
    let guard = SchemaValidationGuard::new();
    let definitions = definitions(Package { resources: vec![thing(&calls)], ..Default::default() });

    assert!(Provider::new(&definitions, &guard).await.is_ok());
    assert!(guard.is_validated());
    assert!(Provider::new(&definitions, &guard).await.is_ok());

    assert_eq!(entries(&calls), vec!["schema"]);
}

#[tokio::test]
async fn failed_validation_is_not_remembered() {
    let calls = Calls::default();
    let guard = SchemaValidationGuard::new();
    let registration = ResourceRegistration::new("aws_thing", "Thing", Arc::new(Things::new(&calls).with_schema(Schema::new())))
        .with_tags(TagsSpec::new("arn"));
    let definitions = definitions(Package { resources: vec![registration], ..Default::default() });

    assert!(Provider::new(&definitions, &guard).await.is_err());
    assert!(!guard.is_validated());
    assert!(Provider::new(&definitions, &guard).await.is_err());

    assert_eq!(entries(&calls), vec!["schema", "schema"]);
}

#[tokio::test]
async fn configure_reaches_every_dispatcher() {
    let calls = Calls::default();
    let package = Package {
        resources: vec![thing(&calls), ResourceRegistration::new("aws_other", "Other", Arc::new(Things::new(&calls)))],
        ..Default::default()
    };
    let provider = build(package).await.unwrap();

    let diags = provider.configure(client()).await;

    assert!(diags.is_empty());
    let configured = entries(&calls).iter().filter(|c| *c == "configure").count();
    assert_eq!(configured, 2);
    assert_eq!(provider.resource_types().collect::<Vec<_>>(), vec!["aws_other", "aws_thing"]);
}
