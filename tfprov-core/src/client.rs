use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use serde::Deserialize;
use smart_default::SmartDefault;
use crate::context::{CallContext, LogRedaction};
use crate::error::{ProviderError, ProviderResult};
use crate::tags::{DefaultConfig, IgnoreConfig, KeyValueTags, TagPolicyConfig};

/// Raw SDK-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsConfig {
    /// Region set in the provider configuration
    pub region: String,
}

/// Cross-cutting capabilities interceptors consume
pub trait AwsClient: Send + Sync {
    fn account_id(&self, ctx: &CallContext) -> String;

    /// The in-context region: the per-resource override if any, else the configured region
    fn region(&self, ctx: &CallContext) -> String;

    fn partition(&self, ctx: &CallContext) -> String;

    fn default_tags_config(&self, ctx: &CallContext) -> Option<DefaultConfig>;

    fn ignore_tags_config(&self, ctx: &CallContext) -> Option<IgnoreConfig>;

    fn tag_policy_config(&self, ctx: &CallContext) -> Option<TagPolicyConfig>;

    fn validate_in_context_region_in_partition(&self, ctx: &CallContext) -> ProviderResult<()>;

    fn aws_config(&self, ctx: &CallContext) -> AwsConfig;

    fn service_package(&self, name: &str) -> Option<Arc<dyn ServicePackage>>;

    fn log_redaction(&self) -> LogRedaction {
        LogRedaction::default()
    }
}

/// Per-service tag APIs used by transparent tagging
#[async_trait::async_trait]
pub trait ServicePackage: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when the service has no generic tag listing
    async fn list_tags(&self, _ctx: &CallContext, _identifier: &str, _resource_type: Option<&str>) -> ProviderResult<Option<KeyValueTags>> {
        Ok(None)
    }

    /// Applies the difference between `old` and `new`
    async fn update_tags(
        &self,
        _ctx: &CallContext,
        _identifier: &str,
        _resource_type: Option<&str>,
        _old: &KeyValueTags,
        _new: &KeyValueTags,
    ) -> ProviderResult<()> {
        Ok(())
    }
}

/// ignore_tags block of the provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IgnoreTagsSettings {
    pub keys: Vec<String>,
    pub key_prefixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, SmartDefault)]
#[serde(default)]
pub struct ProviderConfig {
    pub account_id: String,
    #[default("us-east-1".to_string())]
    pub region: String,
    #[default("aws".to_string())]
    pub partition: String,
    pub default_tags: BTreeMap<String, String>,
    pub ignore_tags: IgnoreTagsSettings,
    pub tag_policy: Option<TagPolicyConfig>,
    pub log_masked_keys: Vec<String>,
}

impl ProviderConfig {
    pub fn from_json(value: serde_json::Value) -> ProviderResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Partition a region belongs to, from its name
pub fn partition_for_region(region: &str) -> &'static str {
    const PREFIXES: [(&str, &str); 6] = [
        ("cn-", "aws-cn"),
        ("us-gov-", "aws-us-gov"),
        ("us-isob-", "aws-iso-b"),
        ("us-isof-", "aws-iso-f"),
        ("us-iso-", "aws-iso"),
        ("eu-isoe-", "aws-iso-e"),
    ];

    PREFIXES
        .iter()
        .find(|(prefix, _)| region.starts_with(prefix))
        .map(|(_, partition)| *partition)
        .unwrap_or("aws")
}

/// Client built from the provider configuration
pub struct ProviderClient {
    config: ProviderConfig,
    service_packages: HashMap<String, Arc<dyn ServicePackage>>,
}

impl ProviderClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            service_packages: HashMap::new(),
        }
    }

    pub fn register_service_package(&mut self, service_package: Arc<dyn ServicePackage>) {
        let name = service_package.name().to_string();
        self.service_packages.insert(name, service_package);
    }

    pub fn with_service_package(mut self, service_package: Arc<dyn ServicePackage>) -> Self {
        self.register_service_package(service_package);
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

impl AwsClient for ProviderClient {
    fn account_id(&self, _ctx: &CallContext) -> String {
        self.config.account_id.clone()
    }

    fn region(&self, ctx: &CallContext) -> String {
        ctx.override_region()
            .map(str::to_string)
            .unwrap_or_else(|| self.config.region.clone())
    }

    fn partition(&self, _ctx: &CallContext) -> String {
        self.config.partition.clone()
    }

    fn default_tags_config(&self, _ctx: &CallContext) -> Option<DefaultConfig> {
        if self.config.default_tags.is_empty() {
            return None;
        }
        Some(DefaultConfig { tags: self.config.default_tags.clone().into() })
    }

    fn ignore_tags_config(&self, _ctx: &CallContext) -> Option<IgnoreConfig> {
        let config = IgnoreConfig {
            keys: self.config.ignore_tags.keys.iter().cloned().collect(),
            key_prefixes: self.config.ignore_tags.key_prefixes.iter().cloned().collect(),
        };
        if config.is_empty() { None } else { Some(config) }
    }

    fn tag_policy_config(&self, _ctx: &CallContext) -> Option<TagPolicyConfig> {
        self.config.tag_policy.clone()
    }

    fn validate_in_context_region_in_partition(&self, ctx: &CallContext) -> ProviderResult<()> {
        let region = self.region(ctx);
        let region_partition = partition_for_region(&region);
        if region_partition != self.config.partition {
            return Err(ProviderError::partition_mismatch(region, region_partition, &self.config.partition));
        }
        Ok(())
    }

    fn aws_config(&self, _ctx: &CallContext) -> AwsConfig {
        AwsConfig { region: self.config.region.clone() }
    }

    fn service_package(&self, name: &str) -> Option<Arc<dyn ServicePackage>> {
        self.service_packages.get(name).cloned()
    }

    fn log_redaction(&self) -> LogRedaction {
        LogRedaction::new(self.config.log_masked_keys.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn client() -> ProviderClient {
        ProviderClient::new(ProviderConfig {
            account_id: "123456789012".into(),
            region: "us-west-2".into(),
            ..Default::default()
        })
    }

    #[test]
    fn config_defaults() {
        let config = ProviderConfig::from_json(json!({ "account_id": "123456789012" })).unwrap();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.partition, "aws");
        assert!(config.tag_policy.is_none());
    }

    #[test]
    fn region_prefers_override() {
        let client = client();
        let ctx = CallContext::new("ec2", "VPC", "aws_vpc");
        assert_eq!(client.region(&ctx), "us-west-2");

        let ctx = ctx.with_override_region(Some("eu-west-1".into()));
        assert_eq!(client.region(&ctx), "eu-west-1");
        assert_eq!(client.aws_config(&ctx).region, "us-west-2");
    }

    #[test]
    fn partition_validation() {
        let client = client();
        let ctx = CallContext::new("ec2", "VPC", "aws_vpc").with_override_region(Some("cn-north-1".into()));
        assert_eq!(
            client.validate_in_context_region_in_partition(&ctx),
            Err(ProviderError::partition_mismatch("cn-north-1", "aws-cn", "aws"))
        );

        let ctx = CallContext::new("ec2", "VPC", "aws_vpc").with_override_region(Some("eu-west-1".into()));
        assert!(client.validate_in_context_region_in_partition(&ctx).is_ok());
    }

    #[test]
    fn partitions() {
        assert_eq!(partition_for_region("us-gov-west-1"), "aws-us-gov");
        assert_eq!(partition_for_region("us-isob-east-1"), "aws-iso-b");
        assert_eq!(partition_for_region("us-iso-east-1"), "aws-iso");
        assert_eq!(partition_for_region("ap-southeast-2"), "aws");
    }

    #[test]
    fn empty_tag_configs_are_none() {
        let client = client();
        let ctx = CallContext::new("ec2", "VPC", "aws_vpc");
        assert!(client.default_tags_config(&ctx).is_none());
        assert!(client.ignore_tags_config(&ctx).is_none());
    }
}
