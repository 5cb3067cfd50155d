use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::Error;

const ARN_PREFIX: &str = "arn";
const KMS_SERVICE: &str = "kms";

/// A KMS key or alias ARN.
///
/// `arn:aws:kms:us-east-1:123456789:key/mrk-123456789`
/// `arn:aws:kms:us-east-1:123456789:alias/snowflake`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyArn {
    pub partition: String,
    pub region: String,
    pub account_id: String,
    pub resource: KeyResource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResource {
    Key(String),
    Alias(String),
}

impl FromStr for KeyArn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidKeyArn(s.to_string());
        let parts: Vec<&str> = s.splitn(6, ':').collect();
        if parts.len() != 6 || parts[0] != ARN_PREFIX || parts[2] != KMS_SERVICE {
            return Err(invalid());
        }
        let (partition, region, account_id, resource) = (parts[1], parts[3], parts[4], parts[5]);
        if partition.is_empty() || region.is_empty() || account_id.is_empty() {
            return Err(invalid());
        }
        let resource = match resource.split_once('/') {
            Some(("key", id)) if !id.is_empty() => KeyResource::Key(id.to_string()),
            Some(("alias", name)) if !name.is_empty() => KeyResource::Alias(name.to_string()),
            _ => return Err(invalid()),
        };
        Ok(Self {
            partition: partition.to_string(),
            region: region.to_string(),
            account_id: account_id.to_string(),
            resource,
        })
    }
}

impl Display for KeyArn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let resource = match &self.resource {
            KeyResource::Key(id) => format!("key/{id}"),
            KeyResource::Alias(name) => format!("alias/{name}"),
        };
        write!(
            f,
            "{ARN_PREFIX}:{}:{KMS_SERVICE}:{}:{}:{}",
            self.partition, self.region, self.account_id, resource
        )
    }
}
