//! Typed identifier newtypes around the opaque strings the server assigns.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Wrap a server-assigned identifier.
            #[must_use]
            pub fn new(value: impl Into<Arc<str>>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is the empty string.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

define_id!(
    /// Identifier of a [`Device`](crate::device::Device).
    DeviceId
);

define_id!(
    /// Identifier of a [`ScheduledTask`](crate::task::ScheduledTask).
    TaskId
);

define_id!(
    /// Identifier of an authenticated session.
    SessionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_compare_equal_when_built_from_same_string() {
        assert_eq!(DeviceId::from("light1"), DeviceId::new(String::from("light1")));
    }

    #[test]
    fn should_display_raw_value() {
        assert_eq!(TaskId::from("abc-123").to_string(), "abc-123");
    }

    #[test]
    fn should_serialize_as_plain_string() {
        let json = serde_json::to_string(&DeviceId::from("light1")).unwrap();
        assert_eq!(json, "\"light1\"");
        let parsed: DeviceId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_str(), "light1");
    }

    #[test]
    fn should_report_empty_identifier() {
        assert!(SessionId::from("").is_empty());
        assert!(!SessionId::from("s").is_empty());
    }
}
