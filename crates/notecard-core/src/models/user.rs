//! User and profile models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The authenticated account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Public-facing profile attached to a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub preferences: Option<Map<String, Value>>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserProfile {
    /// Best human-readable label: display name, then username, then id.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Body for profile create/update requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Map<String, Value>>,
}

/// `GET /auth/user` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub user: User,
    pub profile: UserProfile,
}

/// OAuth login initiation response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthResponse {
    pub url: String,
    #[serde(default)]
    pub message: String,
}

/// Paginated user listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsersPage {
    pub users: Vec<UserProfile>,
    pub limit: u32,
    pub offset: u32,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_label_prefers_display_name() {
        let mut profile = UserProfile {
            id: "u-1".to_string(),
            username: Some("ada".to_string()),
            display_name: Some("Ada Lovelace".to_string()),
            avatar_url: None,
            preferences: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        };
        assert_eq!(profile.label(), "Ada Lovelace");
        profile.display_name = None;
        assert_eq!(profile.label(), "ada");
        profile.username = None;
        assert_eq!(profile.label(), "u-1");
    }

    #[test]
    fn current_user_accepts_missing_optional_fields() {
        let payload = serde_json::json!({
            "user": { "id": "u-1", "email": "ada@example.com" },
            "profile": {
                "id": "u-1",
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-01T00:00:00Z"
            }
        });
        let current: CurrentUser = serde_json::from_value(payload).unwrap();
        assert_eq!(current.user.email, "ada@example.com");
        assert!(current.user.metadata.is_none());
        assert!(current.profile.username.is_none());
    }

    #[test]
    fn profile_input_serializes_only_present_fields() {
        let input = ProfileInput {
            display_name: Some("Ada".to_string()),
            ..ProfileInput::default()
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            serde_json::json!({ "display_name": "Ada" })
        );
    }
}
