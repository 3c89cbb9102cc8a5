use super::types::{ApiErrorBody, PutContentRequest};
use super::{commit_message, encode_content, RepoPublisher, GENERIC_FAILURE};
use crate::models::{PublishTarget, UploadRequest, UploadResult};
use crate::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub struct GithubClient {
    client: Client,
    token: String,
    target: PublishTarget,
}

impl GithubClient {
    pub fn new(token: String, target: PublishTarget) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::new_with_client(token, target, client))
    }

    pub fn new_with_client(token: String, target: PublishTarget, client: Client) -> Self {
        Self {
            client,
            token,
            target,
        }
    }

    async fn put_content(&self, request: &UploadRequest) -> Result<UploadResult> {
        let url = self.target.contents_url(&request.name)?;
        let public_url = self.target.public_url(&request.name)?;
        let body = PutContentRequest {
            message: commit_message(&request.name),
            content: encode_content(&request.content),
            branch: self.target.branch.clone(),
        };

        tracing::debug!("Sending contents PUT to {}", url);

        let response = self
            .client
            .put(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            return Ok(UploadResult::Published { url: public_url });
        }

        let error_text = response.text().await.unwrap_or_default();
        tracing::error!("GitHub API error (status {}): {}", status, error_text);

        let reason = serde_json::from_str::<ApiErrorBody>(&error_text)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());

        Ok(UploadResult::Failed { reason })
    }
}

#[async_trait]
impl RepoPublisher for GithubClient {
    async fn publish(&self, request: &UploadRequest) -> UploadResult {
        match self.put_content(request).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Failed to send upload request to GitHub: {}", e);
                UploadResult::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CONTENTS_PATH: &str = "/repos/octocat/files/contents/public/a.txt";

    fn client_for(server: &MockServer) -> GithubClient {
        GithubClient::new(
            "ghp_test".to_string(),
            PublishTarget {
                owner: "octocat".to_string(),
                repo: "files".to_string(),
                branch: "main".to_string(),
                api_base_url: server.uri(),
                web_base_url: "https://github.com".to_string(),
            },
        )
        .unwrap()
    }

    fn hello() -> UploadRequest {
        UploadRequest::new(b"hello".to_vec(), "a.txt".to_string())
    }

    #[tokio::test]
    async fn test_publish_created_returns_raw_url() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(CONTENTS_PATH))
            .and(header("Authorization", "Bearer ghp_test"))
            .and(header("Accept", "application/vnd.github+json"))
            .and(body_json(serde_json::json!({
                "message": "Upload a.txt from Telegram bot",
                "content": "aGVsbG8=",
                "branch": "main"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "content": { "path": "public/a.txt" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).publish(&hello()).await;

        assert_eq!(
            result,
            UploadResult::Published {
                url: "https://github.com/octocat/files/blob/main/public/a.txt?raw=true"
                    .to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_publish_name_with_reserved_characters() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/repos/octocat/files/contents/public/a%23b%3F.txt"))
            .and(body_json(serde_json::json!({
                "message": "Upload a#b?.txt from Telegram bot",
                "content": "aGVsbG8=",
                "branch": "main"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .publish(&UploadRequest::new(b"hello".to_vec(), "a#b?.txt".to_string()))
            .await;

        assert_eq!(
            result,
            UploadResult::Published {
                url: "https://github.com/octocat/files/blob/main/public/a%23b%3F.txt?raw=true"
                    .to_string()
            }
        );

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url.path(),
            "/repos/octocat/files/contents/public/a%23b%3F.txt"
        );
        assert_eq!(requests[0].url.query(), None);
        assert_eq!(requests[0].url.fragment(), None);
    }

    #[tokio::test]
    async fn test_publish_ok_status_is_success() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(CONTENTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let result = client_for(&server).publish(&hello()).await;
        assert!(result.is_published());
    }

    #[tokio::test]
    async fn test_publish_conflict_uses_remote_message() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(CONTENTS_PATH))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(serde_json::json!({ "message": "sha mismatch" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).publish(&hello()).await;

        assert_eq!(
            result,
            UploadResult::Failed {
                reason: "sha mismatch".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_publish_failure_without_message_uses_generic_reason() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(CONTENTS_PATH))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "errors": []
            })))
            .mount(&server)
            .await;

        let result = client_for(&server).publish(&hello()).await;
        assert_eq!(
            result,
            UploadResult::Failed {
                reason: GENERIC_FAILURE.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_publish_non_json_failure_uses_generic_reason() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(CONTENTS_PATH))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let result = client_for(&server).publish(&hello()).await;
        assert_eq!(
            result,
            UploadResult::Failed {
                reason: GENERIC_FAILURE.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_publish_no_content_status_is_failure() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(CONTENTS_PATH))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let result = client_for(&server).publish(&hello()).await;
        assert!(!result.is_published());
    }

    #[tokio::test]
    async fn test_publish_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(CONTENTS_PATH))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({ "message": "Server Error" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).publish(&hello()).await;
        assert_eq!(
            result,
            UploadResult::Failed {
                reason: "Server Error".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_publish_same_name_twice_overwrites() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(CONTENTS_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let first = client.publish(&hello()).await;
        let second = client
            .publish(&UploadRequest::new(b"bye".to_vec(), "a.txt".to_string()))
            .await;

        assert_eq!(first, second);
        assert!(second.is_published());
    }

    #[tokio::test]
    async fn test_publish_transport_error_is_failure() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        drop(server);

        let result = client.publish(&hello()).await;
        match result {
            UploadResult::Failed { reason } => assert!(!reason.is_empty()),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
