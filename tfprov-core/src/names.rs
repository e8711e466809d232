//! Well-known attribute names.

pub const ATTR_ACCOUNT_ID: &str = "account_id";
pub const ATTR_ARN: &str = "arn";
pub const ATTR_ID: &str = "id";
pub const ATTR_REGION: &str = "region";
pub const ATTR_TAGS: &str = "tags";
pub const ATTR_TAGS_ALL: &str = "tags_all";
pub const ATTR_USER_AGENT: &str = "user_agent";
