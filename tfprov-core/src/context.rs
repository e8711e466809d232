use std::collections::BTreeSet;
use std::fmt;
use parking_lot::Mutex;
use uuid::Uuid;
use crate::tags::{DefaultConfig, IgnoreConfig, KeyValueTags, TagPolicyConfig};

/// One `name/version (comment)` entry of a User-Agent header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentProduct {
    pub name: String,
    pub version: Option<String>,
    pub comment: Option<String>,
}

impl UserAgentProduct {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        let (product, comment) = match value.split_once(" (") {
            Some((product, rest)) => (product, Some(rest.trim_end_matches(')').to_string())),
            None => (value, None),
        };
        let (name, version) = match product.split_once('/') {
            Some((name, version)) => (name.to_string(), Some(version.to_string())),
            None => (product.to_string(), None),
        };
        Self { name, version, comment }
    }
}

impl fmt::Display for UserAgentProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, "/{}", version)?;
        }
        if let Some(comment) = &self.comment {
            write!(f, " ({})", comment)?;
        }
        Ok(())
    }
}

/// Keys whose values must never reach a log line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogRedaction {
    masked_keys: BTreeSet<String>,
}

impl LogRedaction {
    pub const MASK: &'static str = "***";

    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { masked_keys: keys.into_iter().map(Into::into).collect() }
    }

    pub fn is_masked(&self, key: &str) -> bool {
        self.masked_keys.contains(key)
    }

    /// Renders tags for logging, masking the values of masked keys
    pub fn render_tags(&self, tags: &KeyValueTags) -> String {
        let pairs: Vec<String> = tags
            .iter()
            .map(|(k, v)| {
                let v = if self.is_masked(k) { Self::MASK } else { v.as_str() };
                format!("{}={}", k, v)
            })
            .collect();
        format!("{{{}}}", pairs.join(", "))
    }
}

/// Tag configuration plus the tags exchanged with the backing API during one call.
///
/// `tags_in` is what Before-phase tagging decided to send; `tags_out` is what the inner
/// handler read back. Both are written through a shared reference, hence the locks.
#[derive(Debug, Default)]
pub struct TagsContext {
    pub default_config: Option<DefaultConfig>,
    pub ignore_config: Option<IgnoreConfig>,
    pub tag_policy: Option<TagPolicyConfig>,
    tags_in: Mutex<Option<KeyValueTags>>,
    tags_out: Mutex<Option<KeyValueTags>>,
}

impl TagsContext {
    pub fn new(
        default_config: Option<DefaultConfig>,
        ignore_config: Option<IgnoreConfig>,
        tag_policy: Option<TagPolicyConfig>,
    ) -> Self {
        Self {
            default_config,
            ignore_config,
            tag_policy,
            tags_in: Mutex::new(None),
            tags_out: Mutex::new(None),
        }
    }

    pub fn tags_in(&self) -> Option<KeyValueTags> {
        self.tags_in.lock().clone()
    }

    pub fn set_tags_in(&self, tags: KeyValueTags) {
        *self.tags_in.lock() = Some(tags);
    }

    pub fn tags_out(&self) -> Option<KeyValueTags> {
        self.tags_out.lock().clone()
    }

    pub fn set_tags_out(&self, tags: KeyValueTags) {
        *self.tags_out.lock() = Some(tags);
    }
}

/// Per-call context derived by a dispatcher before any interceptor runs
#[derive(Debug)]
pub struct CallContext {
    /// Log correlation key
    pub call_id: Uuid,
    pub service_package: String,
    pub resource_name: String,
    pub type_name: String,
    /// Region taken from the request's `region` attribute
    pub override_region: Option<String>,
    pub user_agent: Vec<UserAgentProduct>,
    pub tags: Option<TagsContext>,
    pub logging: LogRedaction,
}

impl CallContext {
    pub fn new(
        service_package: impl Into<String>,
        resource_name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            service_package: service_package.into(),
            resource_name: resource_name.into(),
            type_name: type_name.into(),
            override_region: None,
            user_agent: Vec::new(),
            tags: None,
            logging: LogRedaction::default(),
        }
    }

    pub fn with_override_region(mut self, region: Option<String>) -> Self {
        self.override_region = region.filter(|r| !r.is_empty());
        self
    }

    pub fn with_user_agent(mut self, products: Vec<UserAgentProduct>) -> Self {
        self.user_agent = products;
        self
    }

    pub fn with_tags(mut self, tags: TagsContext) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_logging(mut self, logging: LogRedaction) -> Self {
        self.logging = logging;
        self
    }

    pub fn override_region(&self) -> Option<&str> {
        self.override_region.as_deref()
    }
}
