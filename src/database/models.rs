use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::Chain;

// 3-20 alphanumerics/underscores; uniqueness is case-insensitive
static USERNAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,20}$").unwrap());

pub fn is_valid_username(username: &str) -> bool {
    USERNAME.is_match(username)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Socials {
    pub twitter: Option<String>,
    pub instagram: Option<String>,
    pub threads: Option<String>,
    pub reddit: Option<String>,
}

/// One directory entry: a claimed username linked to a single wallet
/// address on a single chain. Created by the submission flow and never
/// updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub address: String,
    pub chain: Chain,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "logoUrl")]
    pub logo_url: Option<String>,
    pub socials: Option<Socials>,
}

/// Submission-flow payload, pre-id and pre-timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProfile {
    pub username: String,
    pub address: String,
    pub chain: Chain,
    #[serde(rename = "logoUrl")]
    pub logo_url: Option<String>,
    pub socials: Option<Socials>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_pattern() {
        assert!(is_valid_username("alice_1"));
        assert!(is_valid_username("abc"));
        assert!(is_valid_username("A2345678901234567890"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("way_too_long_username_here"));
        assert!(!is_valid_username("bad-dash"));
        assert!(!is_valid_username("white space"));
        assert!(!is_valid_username(""));
    }

    #[test]
    fn test_profile_wire_names() {
        let profile = UserProfile {
            id: "abc".to_string(),
            username: "alice_1".to_string(),
            address: "0xABCDEF0123456789abcdef0123456789ABCDEF01".to_string(),
            chain: Chain::Eth,
            created_at: 1_700_000_000_000,
            logo_url: None,
            socials: Some(Socials {
                twitter: Some("alice".to_string()),
                ..Default::default()
            }),
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("createdAt").unwrap().is_number());
        assert!(json.get("logoUrl").is_some());
        assert_eq!(json.get("chain").unwrap(), "ETH");
    }
}
