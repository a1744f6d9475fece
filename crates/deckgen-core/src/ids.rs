use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller-assigned identifiers. Unlike generated IDs these carry whatever
/// string the client sent; branding them keeps presentation and slide IDs
/// from being swapped at call sites.
macro_rules! branded_id {
    ($name:ident) => {
        #[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

branded_id!(PresentationId);
branded_id!(SlideId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_value() {
        let id = PresentationId::new("pres_12345");
        assert_eq!(id.as_str(), "pres_12345");
    }

    #[test]
    fn display_and_from_str_roundtrip() {
        let id = SlideId::new("slide_001");
        let s = id.to_string();
        let parsed: SlideId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serde_is_transparent() {
        let id = PresentationId::new("pres_a");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"pres_a\"");
        let parsed: PresentationId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn distinct_values_are_unequal() {
        assert_ne!(SlideId::new("slide_001"), SlideId::new("slide_002"));
    }
}
