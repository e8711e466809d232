use std::collections::{BTreeMap, BTreeSet};
use serde::Deserialize;
use smart_default::SmartDefault;
use crate::diag::Severity;
use crate::types::Value;

/// Tag keys reserved by AWS
pub const SYSTEM_TAG_PREFIX: &str = "aws:";

/// Resource tags as key/value pairs.
///
/// Every operation returns a new set; nothing mutates in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueTags(BTreeMap<String, String>);

impl KeyValueTags {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Known string elements of a map value. Null, unknown and non-map values give an empty set.
    pub fn from_value(value: &Value) -> Self {
        match value.as_map() {
            Some(map) => map
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect(),
            None => Self::new(),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::from(self.0.clone())
    }

    /// Map value, or null when there are no tags
    pub fn to_value_or_null(&self) -> Value {
        if self.is_empty() { Value::Null } else { self.to_value() }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Drops `aws:` prefixed keys
    pub fn ignore_system(&self) -> Self {
        self.filter(|k, _| !k.starts_with(SYSTEM_TAG_PREFIX))
    }

    /// Drops keys named by the provider's ignore_tags configuration
    pub fn ignore_config(&self, config: Option<&IgnoreConfig>) -> Self {
        match config {
            Some(config) => self.filter(|k, _| !config.ignores(k)),
            None => self.clone(),
        }
    }

    /// Union of both sets; `other` wins on duplicate keys
    pub fn merge(&self, other: &KeyValueTags) -> Self {
        let mut merged = self.0.clone();
        merged.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(merged)
    }

    /// Drops every key/value pair also present in the default tags
    pub fn remove_default_config(&self, config: Option<&DefaultConfig>) -> Self {
        match config {
            Some(config) => self.filter(|k, v| config.tags.get(k) != Some(v)),
            None => self.clone(),
        }
    }

    /// Tags as a resource should display them.
    ///
    /// Default tags are removed, except where the state's own `tags` attribute carries the same
    /// key and value; those stay so that configuring a tag that duplicates a default shows no diff.
    pub fn resolve_duplicates(
        &self,
        default_config: Option<&DefaultConfig>,
        ignore_config: Option<&IgnoreConfig>,
        state_tags: &Value,
    ) -> Self {
        let mut result = self.remove_default_config(default_config).0;

        if let Some(default_config) = default_config {
            for (k, v) in KeyValueTags::from_value(state_tags).0 {
                if result.contains_key(&k) {
                    continue;
                }
                if default_config.tags.get(&k) == Some(v.as_str()) {
                    result.insert(k, v);
                }
            }
        }

        Self(result).ignore_config(ignore_config)
    }

    fn filter(&self, keep: impl Fn(&str, &str) -> bool) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, v)| keep(k, v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValueTags {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<BTreeMap<String, String>> for KeyValueTags {
    fn from(value: BTreeMap<String, String>) -> Self {
        Self(value)
    }
}

/// Provider-level default_tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultConfig {
    pub tags: KeyValueTags,
}

impl DefaultConfig {
    /// Default tags merged with a resource's own tags; the resource wins
    pub fn merge_tags(config: Option<&DefaultConfig>, tags: &KeyValueTags) -> KeyValueTags {
        match config {
            Some(config) => config.tags.merge(tags),
            None => tags.clone(),
        }
    }
}

/// Provider-level ignore_tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    pub keys: BTreeSet<String>,
    pub key_prefixes: BTreeSet<String>,
}

impl IgnoreConfig {
    pub fn ignores(&self, key: &str) -> bool {
        self.keys.contains(key) || self.key_prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.key_prefixes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, SmartDefault, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagPolicySeverity {
    #[default]
    Error,
    Warning,
}

impl From<TagPolicySeverity> for Severity {
    fn from(value: TagPolicySeverity) -> Self {
        match value {
            TagPolicySeverity::Error => Severity::Error,
            TagPolicySeverity::Warning => Severity::Warning,
        }
    }
}

/// Required tag keys per resource type
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TagPolicyConfig {
    pub severity: TagPolicySeverity,
    pub required_tags: BTreeMap<String, BTreeSet<String>>,
}

impl TagPolicyConfig {
    pub fn required_for(&self, type_name: &str) -> Option<&BTreeSet<String>> {
        self.required_tags.get(type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tags(pairs: &[(&str, &str)]) -> KeyValueTags {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn ignore_system() {
        let t = tags(&[("aws:cloudformation:stack-name", "x"), ("key1", "value1")]);
        assert_eq!(t.ignore_system(), tags(&[("key1", "value1")]));
    }

    #[test]
    fn ignore_config_keys_and_prefixes() {
        let t = tags(&[("key1", "value1"), ("key2", "value2"), ("prefix-key3", "value3")]);
        let config = IgnoreConfig {
            keys: ["key1".to_string()].into_iter().collect(),
            key_prefixes: ["prefix-".to_string()].into_iter().collect(),
        };

        assert_eq!(t.ignore_config(Some(&config)), tags(&[("key2", "value2")]));
        assert_eq!(t.ignore_config(None), t);
    }

    #[test]
    fn merge_other_wins() {
        let a = tags(&[("key1", "value1"), ("key2", "value2")]);
        let b = tags(&[("key2", "value2updated"), ("key3", "value3")]);
        assert_eq!(
            a.merge(&b),
            tags(&[("key1", "value1"), ("key2", "value2updated"), ("key3", "value3")])
        );
    }

    #[test]
    fn default_config_merge_tags() {
        let defaults = DefaultConfig { tags: tags(&[("key1", "default"), ("key2", "value2")]) };
        let resource = tags(&[("key1", "value1")]);

        assert_eq!(
            DefaultConfig::merge_tags(Some(&defaults), &resource),
            tags(&[("key1", "value1"), ("key2", "value2")])
        );
        assert_eq!(DefaultConfig::merge_tags(None, &resource), resource);
    }

    #[test]
    fn remove_default_config_only_matching_values() {
        let defaults = DefaultConfig { tags: tags(&[("key1", "value1"), ("key2", "other")]) };
        let t = tags(&[("key1", "value1"), ("key2", "value2"), ("key3", "value3")]);

        assert_eq!(
            t.remove_default_config(Some(&defaults)),
            tags(&[("key2", "value2"), ("key3", "value3")])
        );
        assert_eq!(t.remove_default_config(None), t);
    }

    #[test]
    fn resolve_duplicates_keeps_configured_defaults() {
        let defaults = DefaultConfig { tags: tags(&[("env", "prod"), ("team", "core")]) };
        let api = tags(&[("env", "prod"), ("team", "core"), ("Name", "web")]);
        // The resource itself also configures env=prod.
        let state_tags = Value::from(json!({ "env": "prod", "Name": "web" }));

        assert_eq!(
            api.resolve_duplicates(Some(&defaults), None, &state_tags),
            tags(&[("Name", "web"), ("env", "prod")])
        );
    }

    #[test]
    fn from_value_skips_unknown_elements() {
        let value = Value::Map(
            [("a".to_string(), Value::string("1")), ("b".to_string(), Value::Unknown)]
                .into_iter()
                .collect(),
        );
        assert_eq!(KeyValueTags::from_value(&value), tags(&[("a", "1")]));
        assert!(KeyValueTags::from_value(&Value::Null).is_empty());
    }

    #[test]
    fn tag_policy_from_json() {
        let policy: TagPolicyConfig = serde_json::from_value(json!({
            "severity": "warning",
            "required_tags": { "aws_thing": ["Owner", "CostCenter"] }
        })).unwrap();

        assert_eq!(policy.severity, TagPolicySeverity::Warning);
        assert_eq!(policy.required_for("aws_thing").map(|k| k.len()), Some(2));
        assert!(policy.required_for("aws_other").is_none());
    }
}
