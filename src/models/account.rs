use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated user's profile, stored and round-tripped as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// API key metadata
///
/// `key` holds the full secret and is only present in the response to the
/// creation call. It cannot be fetched again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: String,
    pub name: String,
    pub key_prefix: String,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateApiKeyRequest<'a> {
    pub name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_profile_optional_name() {
        let user: UserProfile = serde_json::from_value(json!({
            "id": "u-1",
            "email": "alice@example.com",
            "created_at": "2025-01-12T10:30:00"
        }))
        .unwrap();
        assert_eq!(user.name, None);

        let user: UserProfile = serde_json::from_value(json!({
            "id": "u-1",
            "email": "alice@example.com",
            "name": null,
            "created_at": "2025-01-12T10:30:00Z"
        }))
        .unwrap();
        assert_eq!(user.name, None);
    }

    #[test]
    fn test_listed_api_key_has_no_secret() {
        let key: ApiKey = serde_json::from_value(json!({
            "id": "k-1",
            "name": "ci",
            "key_prefix": "ulu_ab12",
            "created_at": "2025-01-12T10:30:00Z"
        }))
        .unwrap();
        assert_eq!(key.key, None);

        let value = serde_json::to_value(&key).unwrap();
        assert!(value.get("key").is_none());
    }

    #[test]
    fn test_created_api_key_carries_secret() {
        let key: ApiKey = serde_json::from_value(json!({
            "id": "k-1",
            "name": "ci",
            "key_prefix": "ulu_ab12",
            "created_at": "2025-01-12T10:30:00Z",
            "key": "ulu_ab12cdef3456"
        }))
        .unwrap();
        assert_eq!(key.key.as_deref(), Some("ulu_ab12cdef3456"));
    }
}
