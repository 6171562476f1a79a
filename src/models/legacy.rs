//! State shape of the legacy `aws_ssm_parameter` resource (schema version 0).
//!
//! Only accepted as migration input. Fields this provider does not manage
//! (`id`, `key_id`, `tier`, `tags_all`, `insecure_value`) are parsed and dropped.

use crate::models::{DataType, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyRecord {
    pub name: String,

    #[serde(rename = "type")]
    pub value_kind: ValueKind,

    #[serde(default)]
    pub allowed_pattern: Option<String>,

    #[serde(default)]
    pub arn: Option<String>,

    #[serde(default)]
    pub data_type: Option<DataType>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub insecure_value: Option<String>,

    #[serde(default)]
    pub key_id: Option<String>,

    #[serde(default)]
    pub overwrite: Option<bool>,

    #[serde(default)]
    pub tags: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub tags_all: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub tier: Option<String>,

    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub version: Option<i64>,
}
