//! # Parameter Records
//!
//! The local representation of a managed parameter ([`ParameterRecord`]) and the
//! shapes returned by the remote store ([`RemoteParameter`], [`ParameterMetadata`]).

use crate::constants::Attribute;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How the remote store holds a parameter's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// `String`
    #[serde(rename = "String")]
    PlainText,
    /// `StringList`, comma delimited
    #[serde(rename = "StringList")]
    TextList,
    /// `SecureString`, KMS encrypted
    #[serde(rename = "SecureString")]
    Encrypted,
}

impl ValueKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ValueKind::PlainText => "String",
            ValueKind::TextList => "StringList",
            ValueKind::Encrypted => "SecureString",
        }
    }

    pub const fn is_encrypted(self) -> bool {
        matches!(self, ValueKind::Encrypted)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "String" => Ok(ValueKind::PlainText),
            "StringList" => Ok(ValueKind::TextList),
            "SecureString" => Ok(ValueKind::Encrypted),
            other => Err(format!(
                "invalid parameter type {other:?}, expected one of String, StringList, SecureString"
            )),
        }
    }
}

/// Data type tag validated by the remote store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[default]
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "aws:ec2:image")]
    AmiId,
    #[serde(rename = "aws:ssm:integration")]
    SsmIntegration,
}

impl DataType {
    pub const fn as_str(self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::AmiId => "aws:ec2:image",
            DataType::SsmIntegration => "aws:ssm:integration",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(DataType::Text),
            "aws:ec2:image" => Ok(DataType::AmiId),
            "aws:ssm:integration" => Ok(DataType::SsmIntegration),
            other => Err(format!(
                "invalid data type {other:?}, expected one of text, aws:ec2:image, aws:ssm:integration"
            )),
        }
    }
}

/// Local state of one managed parameter
///
/// `name`, `value_kind` and `data_type` are immutable once created; changing any of
/// them forces replacement. `arn` and `version` are only ever populated from remote
/// responses.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterRecord {
    /// Full path-qualified parameter name (the resource identity)
    pub name: String,

    /// Sensitive value field; authoritative for encrypted parameters
    #[serde(default)]
    pub value: Option<String>,

    /// Never-sensitive mirror of a plaintext value
    #[serde(default)]
    pub insecure_value: Option<String>,

    /// Remote `type`
    #[serde(rename = "type")]
    pub value_kind: ValueKind,

    #[serde(default)]
    pub data_type: DataType,

    #[serde(default)]
    pub allowed_pattern: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Remote-assigned ARN
    #[serde(default)]
    pub arn: Option<String>,

    /// Remote-assigned version
    #[serde(default)]
    pub version: Option<i64>,

    /// Deprecated; local only
    #[serde(default)]
    pub overwrite: Option<bool>,

    /// Deprecated; accepted for compatibility, never sent to the store
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl ParameterRecord {
    pub fn new(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            value: None,
            insecure_value: None,
            value_kind,
            data_type: DataType::default(),
            allowed_pattern: None,
            description: None,
            arn: None,
            version: None,
            overwrite: None,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_insecure_value(mut self, value: impl Into<String>) -> Self {
        self.insecure_value = Some(value.into());
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_allowed_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.allowed_pattern = Some(pattern.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = Some(overwrite);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// True once a create or read round trip has populated the remote identity
    pub fn is_known_remotely(&self) -> bool {
        self.arn.is_some() && self.version.is_some()
    }
}

impl fmt::Debug for ParameterRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterRecord")
            .field("name", &self.name)
            .field("value", &self.value.as_ref().map(|_| "[SENSITIVE]"))
            .field("insecure_value", &self.insecure_value)
            .field("value_kind", &self.value_kind)
            .field("data_type", &self.data_type)
            .field("allowed_pattern", &self.allowed_pattern)
            .field("description", &self.description)
            .field("arn", &self.arn)
            .field("version", &self.version)
            .field("overwrite", &self.overwrite)
            .field("tags", &self.tags)
            .finish()
    }
}

/// A parameter as returned by a direct fetch
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteParameter {
    pub name: String,
    pub arn: String,
    pub value_kind: ValueKind,
    pub version: i64,
    /// Decrypted when requested, ciphertext otherwise for encrypted parameters
    pub value: String,
    pub data_type: DataType,
    pub last_modified: Option<DateTime<Utc>>,
}

impl RemoteParameter {
    /// Directly-fetchable fields that differ from the local record
    ///
    /// The local side of `value` is the operative value for its kind.
    pub fn changed_fields(&self, local: &ParameterRecord) -> Vec<Attribute> {
        let mut changed = Vec::new();
        if self.name != local.name {
            changed.push(Attribute::Name);
        }
        if self.value_kind != local.value_kind {
            changed.push(Attribute::Type);
        }
        if self.data_type != local.data_type {
            changed.push(Attribute::DataType);
        }
        let local_value = crate::reconcile::value_routing::operative_value(local);
        if local_value != Some(self.value.as_str()) {
            changed.push(Attribute::Value);
        }
        changed
    }
}

impl fmt::Debug for RemoteParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteParameter")
            .field("name", &self.name)
            .field("arn", &self.arn)
            .field("value_kind", &self.value_kind)
            .field("version", &self.version)
            .field("value", &"[SENSITIVE]")
            .field("data_type", &self.data_type)
            .field("last_modified", &self.last_modified)
            .finish()
    }
}

/// Metadata only available through the enumeration call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    pub name: String,
    pub value_kind: ValueKind,
    pub data_type: DataType,
    pub version: i64,
    pub description: Option<String>,
    pub allowed_pattern: Option<String>,
    pub key_id: Option<String>,
    pub tier: Option<String>,
    pub last_modified_user: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}
