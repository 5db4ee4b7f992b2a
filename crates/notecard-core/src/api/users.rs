//! Profile and user directory endpoints.

use reqwest::Method;

use super::{to_body, ApiClient};
use crate::auth::TokenStorage;
use crate::error::ApiResult;
use crate::models::{Empty, ProfileInput, UserProfile, UsersPage};

const PROFILE_ENDPOINT: &str = "/api/users/profile";

impl<S: TokenStorage> ApiClient<S> {
    pub async fn user_profile(&self) -> ApiResult<UserProfile> {
        self.request(Method::GET, PROFILE_ENDPOINT, None).await
    }

    pub async fn create_user_profile(&self, input: &ProfileInput) -> ApiResult<UserProfile> {
        self.request(Method::POST, PROFILE_ENDPOINT, Some(to_body(input)?))
            .await
    }

    pub async fn update_user_profile(&self, input: &ProfileInput) -> ApiResult<UserProfile> {
        self.request(Method::PUT, PROFILE_ENDPOINT, Some(to_body(input)?))
            .await
    }

    pub async fn delete_user_profile(&self) -> ApiResult<Empty> {
        self.request(Method::DELETE, PROFILE_ENDPOINT, None).await
    }

    pub async fn user_by_username(&self, username: &str) -> ApiResult<UserProfile> {
        let endpoint = format!("/api/users/{}", urlencoding::encode(username));
        self.request(Method::GET, &endpoint, None).await
    }

    pub async fn list_users(&self, limit: u32, offset: u32) -> ApiResult<UsersPage> {
        let endpoint = format!("/api/users?limit={limit}&offset={offset}");
        self.request(Method::GET, &endpoint, None).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use super::*;
    use crate::auth::{AuthStore, MemoryTokenStorage};
    use crate::config::ClientConfig;
    use crate::test_server::{MockResponse, MockServer};

    fn profile_json() -> Value {
        json!({
            "id": "u-1",
            "username": "ada",
            "display_name": "Ada",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    fn client_for(server: &MockServer) -> ApiClient<MemoryTokenStorage> {
        let config = ClientConfig::new(server.base_url(), None).unwrap();
        let storage = MemoryTokenStorage::with_tokens(Some("access-1"), None);
        ApiClient::new(config, storage, Arc::new(AuthStore::new())).unwrap()
    }

    #[tokio::test]
    async fn profile_crud_uses_expected_methods() {
        let server = MockServer::start(vec![
            MockResponse::json(200, profile_json()),
            MockResponse::json(201, profile_json()),
            MockResponse::json(200, profile_json()),
            MockResponse::empty(204),
        ])
        .await;
        let client = client_for(&server);
        let input = ProfileInput {
            display_name: Some("Ada".to_string()),
            ..ProfileInput::default()
        };

        client.user_profile().await.unwrap();
        client.create_user_profile(&input).await.unwrap();
        let updated = client.update_user_profile(&input).await.unwrap();
        client.delete_user_profile().await.unwrap();

        assert_eq!(updated.label(), "Ada");
        let requests = server.requests();
        let methods = requests.iter().map(|r| r.method.as_str()).collect::<Vec<_>>();
        assert_eq!(methods, vec!["GET", "POST", "PUT", "DELETE"]);
        assert!(requests.iter().all(|r| r.path == PROFILE_ENDPOINT));
        assert_eq!(
            serde_json::from_str::<Value>(&requests[1].body).unwrap(),
            json!({ "display_name": "Ada" })
        );
    }

    #[tokio::test]
    async fn username_is_percent_encoded() {
        let server = MockServer::start(vec![MockResponse::json(200, profile_json())]).await;
        let client = client_for(&server);

        client.user_by_username("ada lovelace/1").await.unwrap();
        assert_eq!(server.requests()[0].path, "/api/users/ada%20lovelace%2F1");
    }

    #[tokio::test]
    async fn list_users_sends_pagination_query() {
        let server = MockServer::start(vec![MockResponse::json(
            200,
            json!({ "users": [profile_json()], "limit": 5, "offset": 10, "count": 1 }),
        )])
        .await;
        let client = client_for(&server);

        let page = client.list_users(5, 10).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.users[0].id, "u-1");
        assert_eq!(server.requests()[0].path, "/api/users?limit=5&offset=10");
    }
}
