//! Which of the two value fields is authoritative for a record.
//!
//! `value` is sensitive and authoritative for encrypted parameters. For the
//! plaintext kinds `insecure_value` carries the remote plaintext and `value`
//! stays empty, so a routed record always holds exactly one of the two. Routing
//! is recomputed on every read and write.

use crate::models::{ParameterRecord, RemoteParameter, ValueKind};

/// The value to send on write: `insecure_value` for plaintext kinds when present, else `value`
pub fn operative_value(record: &ParameterRecord) -> Option<&str> {
    match (&record.insecure_value, record.value_kind.is_encrypted()) {
        (Some(insecure), false) => Some(insecure.as_str()),
        _ => record.value.as_deref(),
    }
}

/// Value fields derived from a fetch
#[derive(Clone, PartialEq, Eq)]
pub struct RoutedValue {
    pub value: Option<String>,
    pub insecure_value: Option<String>,
}

impl std::fmt::Debug for RoutedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutedValue")
            .field("value", &self.value.as_ref().map(|_| "[SENSITIVE]"))
            .field("insecure_value", &self.insecure_value)
            .finish()
    }
}

impl RoutedValue {
    pub fn apply_to(self, record: &mut ParameterRecord) {
        record.value = self.value;
        record.insecure_value = self.insecure_value;
    }
}

/// Route a fetched value into the record's value fields
///
/// Exactly one field is populated: `value` for encrypted parameters (decrypted
/// or ciphertext), `insecure_value` for the plaintext kinds.
pub fn route_fetched(remote: &RemoteParameter) -> RoutedValue {
    route_by_kind(remote.value_kind, remote.value.clone())
}

/// Re-derive the value fields of a record that was just written
///
/// The operative value moves into the field its kind owns and the other is cleared.
pub fn route_written(record: &mut ParameterRecord) {
    if let Some(value) = operative_value(record).map(str::to_string) {
        route_by_kind(record.value_kind, value).apply_to(record);
    } else {
        record.insecure_value = None;
    }
}

fn route_by_kind(kind: ValueKind, value: String) -> RoutedValue {
    if kind.is_encrypted() {
        RoutedValue {
            value: Some(value),
            insecure_value: None,
        }
    } else {
        RoutedValue {
            value: None,
            insecure_value: Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataType;
    use proptest::prelude::*;

    fn remote(kind: ValueKind, value: &str) -> RemoteParameter {
        RemoteParameter {
            name: "/a".to_string(),
            arn: "arn:aws:ssm:us-east-1:123456789012:parameter/a".to_string(),
            value_kind: kind,
            version: 1,
            value: value.to_string(),
            data_type: DataType::Text,
            last_modified: None,
        }
    }

    fn value_kind() -> impl Strategy<Value = ValueKind> {
        prop_oneof![
            Just(ValueKind::PlainText),
            Just(ValueKind::TextList),
            Just(ValueKind::Encrypted),
        ]
    }

    #[test]
    fn test_operative_value_prefers_insecure_for_plaintext() {
        let record = ParameterRecord::new("/a", ValueKind::PlainText)
            .with_value("v")
            .with_insecure_value("i");
        assert_eq!(operative_value(&record), Some("i"));

        let record = ParameterRecord::new("/a", ValueKind::TextList).with_value("a,b");
        assert_eq!(operative_value(&record), Some("a,b"));
    }

    #[test]
    fn test_operative_value_ignores_insecure_for_encrypted() {
        let record = ParameterRecord::new("/a", ValueKind::Encrypted).with_insecure_value("leak");
        assert_eq!(operative_value(&record), None);
    }

    #[test]
    fn test_route_written_never_mirrors_encrypted() {
        let mut record = ParameterRecord::new("/a", ValueKind::Encrypted)
            .with_value("secret")
            .with_insecure_value("stale");
        route_written(&mut record);
        assert_eq!(record.insecure_value, None);
        assert_eq!(record.value.as_deref(), Some("secret"));
    }

    #[test]
    fn test_route_written_moves_plaintext_into_insecure_value() {
        let mut record = ParameterRecord::new("/a", ValueKind::PlainText).with_value("test-value-123");
        route_written(&mut record);
        assert_eq!(record.insecure_value.as_deref(), Some("test-value-123"));
        assert_eq!(record.value, None);
    }

    #[test]
    fn test_route_fetched_ignores_stale_plaintext_value() {
        let mut record = ParameterRecord::new("/a", ValueKind::PlainText).with_value("old");
        route_fetched(&remote(ValueKind::PlainText, "new")).apply_to(&mut record);
        assert_eq!(record.value, None);
        assert_eq!(record.insecure_value.as_deref(), Some("new"));
    }

    proptest! {
        #[test]
        fn fetch_populates_exactly_one_field(kind in value_kind(), value in ".{0,32}") {
            let routed = route_fetched(&remote(kind, &value));
            prop_assert!(routed.value.is_some() != routed.insecure_value.is_some());
            if kind.is_encrypted() {
                prop_assert_eq!(routed.value.as_deref(), Some(value.as_str()));
            } else {
                prop_assert_eq!(routed.insecure_value.as_deref(), Some(value.as_str()));
            }
        }

        #[test]
        fn encrypted_fetch_never_exposes_insecure_value(
            value in ".{0,32}",
            prior_insecure in proptest::option::of(".{0,16}"),
        ) {
            let mut record = ParameterRecord::new("/a", ValueKind::Encrypted).with_value("old");
            record.insecure_value = prior_insecure;
            route_fetched(&remote(ValueKind::Encrypted, &value)).apply_to(&mut record);
            prop_assert_eq!(record.insecure_value, None);
        }

        #[test]
        fn written_record_routes_operative_value(kind in value_kind(), value in ".{1,32}") {
            let mut record = ParameterRecord::new("/a", kind).with_value(value.clone());
            route_written(&mut record);
            prop_assert!(record.value.is_some() != record.insecure_value.is_some());
            if kind.is_encrypted() {
                prop_assert_eq!(record.insecure_value, None);
            } else {
                prop_assert_eq!(record.insecure_value, Some(value));
            }
        }
    }
}
