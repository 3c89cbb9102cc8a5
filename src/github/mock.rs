use super::{RepoPublisher, GENERIC_FAILURE};
use crate::models::{PublishTarget, UploadRequest, UploadResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockPublisher {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    target: PublishTarget,
    failure: Arc<Mutex<Option<String>>>,
    publish_count: Arc<Mutex<usize>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            target: PublishTarget {
                owner: "mock".to_string(),
                repo: "repo".to_string(),
                branch: "main".to_string(),
                api_base_url: "https://api.github.com".to_string(),
                web_base_url: "https://github.com".to_string(),
            },
            failure: Arc::new(Mutex::new(None)),
            publish_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_target(mut self, target: PublishTarget) -> Self {
        self.target = target;
        self
    }

    /// Reject every publish with the given reason.
    pub fn with_failure(self, reason: Option<String>) -> Self {
        *self.failure.lock().unwrap() =
            Some(reason.unwrap_or_else(|| GENERIC_FAILURE.to_string()));
        self
    }

    pub fn get_publish_count(&self) -> usize {
        *self.publish_count.lock().unwrap()
    }

    pub fn get_files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepoPublisher for MockPublisher {
    async fn publish(&self, request: &UploadRequest) -> UploadResult {
        *self.publish_count.lock().unwrap() += 1;

        if let Some(reason) = self.failure.lock().unwrap().clone() {
            return UploadResult::Failed { reason };
        }

        let url = match self.target.public_url(&request.name) {
            Ok(url) => url,
            Err(e) => {
                return UploadResult::Failed {
                    reason: e.to_string(),
                }
            }
        };
        self.files.lock().unwrap().insert(
            PublishTarget::content_path(&request.name),
            request.content.clone(),
        );

        UploadResult::Published { url }
    }
}
