//! Data models and structures
//!
//! Defines the upload request/outcome types passed between the bot and the
//! repository publisher, plus process configuration.

use crate::Error;
use reqwest::Url;

/// Bytes received from a chat together with the file name to commit them under.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub content: Vec<u8>,
    pub name: String,
}

impl UploadRequest {
    pub fn new(content: Vec<u8>, name: String) -> Self {
        Self { content, name }
    }
}

/// Outcome of a single publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResult {
    Published { url: String },
    Failed { reason: String },
}

impl UploadResult {
    pub fn is_published(&self) -> bool {
        matches!(self, UploadResult::Published { .. })
    }
}

/// Repository coordinates that every upload is committed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub api_base_url: String,
    pub web_base_url: String,
}

impl PublishTarget {
    /// Repository path of an uploaded file. The name is used verbatim.
    pub fn content_path(name: &str) -> String {
        format!("public/{}", name)
    }

    /// Contents API endpoint for `public/<name>`.
    ///
    /// The name is one percent-encoded path segment, so `#`, `?` and `/`
    /// stay part of the file name.
    pub fn contents_url(&self, name: &str) -> crate::Result<Url> {
        let mut url = parse_base_url(&self.api_base_url)?;
        extend_path(
            &mut url,
            [
                "repos",
                self.owner.as_str(),
                self.repo.as_str(),
                "contents",
                "public",
                name,
            ],
        )?;
        Ok(url)
    }

    pub fn public_url(&self, name: &str) -> crate::Result<String> {
        let mut url = parse_base_url(&self.web_base_url)?;
        extend_path(&mut url, [self.owner.as_str(), self.repo.as_str(), "blob"])?;
        // Branch names may contain slashes, which GitHub expects unescaped.
        extend_path(&mut url, self.branch.split('/'))?;
        extend_path(&mut url, ["public", name])?;
        url.set_query(Some("raw=true"));
        Ok(url.into())
    }
}

fn parse_base_url(base: &str) -> crate::Result<Url> {
    Url::parse(base).map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", base, e)))
}

fn extend_path<'a, I>(url: &mut Url, segments: I) -> crate::Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let base = url.to_string();
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("Base URL '{}' cannot take a path", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(())
}

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_WEB_URL: &str = "https://github.com";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    pub telegram_api_url: String,
    pub github_token: String,
    pub target: PublishTarget,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| crate::Error::Config(format!("{} not set", key)))
        };

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| crate::Error::Config(format!("Invalid PORT '{}'", raw)))?,
            None => DEFAULT_PORT,
        };

        let config = Self {
            telegram_token: required("TELEGRAM_BOT_TOKEN")?,
            telegram_api_url: lookup("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            github_token: required("GITHUB_TOKEN")?,
            target: PublishTarget {
                owner: required("GITHUB_USERNAME")?,
                repo: required("GITHUB_REPO")?,
                branch: lookup("GITHUB_REPO_BRANCH")
                    .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
                api_base_url: lookup("GITHUB_API_URL")
                    .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
                web_base_url: lookup("GITHUB_WEB_URL")
                    .unwrap_or_else(|| DEFAULT_GITHUB_WEB_URL.to_string()),
            },
            port,
        };

        parse_base_url(&config.target.api_base_url)?;
        parse_base_url(&config.target.web_base_url)?;
        parse_base_url(&config.telegram_api_url)?;
        Ok(config)
    }
}
