//! Decision fusion
//!
//! A document is only called authentic when every check passed. Any metadata
//! flag or any failed (or skipped) visual check makes it suspicious.

use std::fmt;

use serde::Serialize;

/// Final verdict for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Classification {
    #[serde(rename = "Likely Authentic")]
    LikelyAuthentic,
    #[serde(rename = "Suspicious")]
    Suspicious,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::LikelyAuthentic => "Likely Authentic",
            Classification::Suspicious => "Suspicious",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combine the independent checks into a verdict
pub fn classify(metadata_flags: &[String], logo_verified: bool, template_verified: bool) -> Classification {
    if !metadata_flags.is_empty() || !logo_verified || !template_verified {
        Classification::Suspicious
    } else {
        Classification::LikelyAuthentic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_all_checks_pass() {
        assert_eq!(classify(&[], true, true), Classification::LikelyAuthentic);
    }

    #[test]
    fn test_any_failure_is_suspicious() {
        let flags = vec!["Modified: D:20240101".to_string()];
        assert_eq!(classify(&flags, true, true), Classification::Suspicious);
        assert_eq!(classify(&[], false, true), Classification::Suspicious);
        assert_eq!(classify(&[], true, false), Classification::Suspicious);
        assert_eq!(classify(&flags, false, false), Classification::Suspicious);
    }

    #[test]
    fn test_serialized_labels() {
        assert_eq!(
            serde_json::to_string(&Classification::LikelyAuthentic).unwrap(),
            "\"Likely Authentic\""
        );
        assert_eq!(
            serde_json::to_string(&Classification::Suspicious).unwrap(),
            "\"Suspicious\""
        );
        assert_eq!(Classification::Suspicious.to_string(), "Suspicious");
    }

    proptest! {
        #[test]
        fn prop_suspicious_iff_any_check_fails(
            flags in proptest::collection::vec("[A-Za-z :0-9]{1,20}", 0..3),
            logo in any::<bool>(),
            template in any::<bool>(),
        ) {
            let expected = if !flags.is_empty() || !logo || !template {
                Classification::Suspicious
            } else {
                Classification::LikelyAuthentic
            };
            prop_assert_eq!(classify(&flags, logo, template), expected);
        }
    }
}
