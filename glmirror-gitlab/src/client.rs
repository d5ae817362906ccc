//! GitLab REST API client using reqwest

use std::time::Duration;

use async_trait::async_trait;
use glmirror_core::{Branch, FetchError, GitLabConfig, Group, Project, ProjectSource};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::types::{ApiBranch, ApiGroup, ApiProject};
use crate::{GitLabError, Result};

/// Path prefix of the v4 REST API
pub const API_PREFIX: &str = "api/v4";

/// Largest page size GitLab accepts
pub const MAX_PER_PAGE: u32 = 100;

/// Paging and timeout behaviour of a [`GitLabClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Items per page, clamped to 1..=100
    pub per_page: u32,
    /// Follow `X-Next-Page`; when false only the first page is read
    pub paginate: bool,
    /// Upper bound on pages read per listing
    pub max_pages: u32,
    /// Timeout for each HTTP request
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::from(&GitLabConfig::default())
    }
}

impl From<&GitLabConfig> for ClientOptions {
    fn from(config: &GitLabConfig) -> Self {
        Self {
            per_page: config.per_page,
            paginate: config.paginate,
            max_pages: config.max_pages,
            timeout: config.request_timeout,
        }
    }
}

/// GitLab API client authenticated with a personal access token
pub struct GitLabClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    options: ClientOptions,
}

impl std::fmt::Debug for GitLabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabClient")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl GitLabClient {
    /// Create a client for the instance at `base_url` (e.g. "https://gitlab.com")
    pub fn new(base_url: &str, token: impl Into<String>, options: ClientOptions) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| GitLabError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GitLabError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("glmirror/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GitLabError::Client(e.to_string()))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        info!(base_url = %base_url, per_page = options.per_page, paginate = options.paginate, "Created GitLab client");

        Ok(Self {
            http,
            base_url,
            token: token.into(),
            options,
        })
    }

    /// Create a client from the `[gitlab]` configuration section
    pub fn from_config(config: &GitLabConfig, token: impl Into<String>) -> Result<Self> {
        Self::new(&config.url, token, ClientOptions::from(config))
    }

    /// Replace the underlying reqwest client
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Get the base URL (without trailing slash)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of one page of `path` (relative to `/api/v4/`).
    ///
    /// The result carries the token, so it must not be logged.
    fn page_url(&self, path: &str, page: u32) -> Result<Url> {
        let raw = format!("{}/{}/{}", self.base_url, API_PREFIX, path);
        let mut url = Url::parse(&raw).map_err(|e| GitLabError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("private_token", &self.token)
            .append_pair(
                "per_page",
                &self.options.per_page.clamp(1, MAX_PER_PAGE).to_string(),
            )
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    /// GET every page of a list endpoint
    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            debug!(path, page, "GET");
            let response = self.http.get(self.page_url(path, page)?).send().await?;

            let status = response.status();
            if status != StatusCode::OK {
                let body = response.text().await.unwrap_or_default();
                return Err(GitLabError::from_status(status, &body));
            }

            let next = next_page(response.headers());
            let body = response.bytes().await?;
            let batch: Vec<T> = serde_json::from_slice(&body)?;
            items.extend(batch);

            let Some(next) = next else { break };
            if !self.options.paginate {
                debug!(path, "More pages available, pagination disabled");
                break;
            }
            if page >= self.options.max_pages {
                warn!(path, max_pages = self.options.max_pages, "Page limit reached, listing truncated");
                break;
            }
            if next <= page {
                warn!(path, page, next, "Non-increasing X-Next-Page, stopping");
                break;
            }
            page = next;
        }

        Ok(items)
    }

    /// `GET /groups`
    pub async fn groups(&self) -> Result<Vec<Group>> {
        let groups: Vec<ApiGroup> = self.get_list("groups").await?;
        Ok(groups.into_iter().map(Group::from).collect())
    }

    /// `GET /groups/:id/projects`
    pub async fn group_projects(&self, group_id: u64) -> Result<Vec<Project>> {
        let projects: Vec<ApiProject> = self
            .get_list(&format!("groups/{}/projects", group_id))
            .await?;
        Ok(projects.into_iter().map(Project::from).collect())
    }

    /// `GET /projects/:id/repository/branches`
    pub async fn project_branches(&self, project_id: u64) -> Result<Vec<Branch>> {
        let branches: Vec<ApiBranch> = self
            .get_list(&format!("projects/{}/repository/branches", project_id))
            .await?;
        Ok(branches.into_iter().map(Branch::from).collect())
    }
}

/// The page number in GitLab's `X-Next-Page` header; empty on the last page
pub fn next_page(headers: &HeaderMap) -> Option<u32> {
    headers
        .get("x-next-page")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

#[async_trait]
impl ProjectSource for GitLabClient {
    async fn list_groups(&self) -> std::result::Result<Vec<Group>, FetchError> {
        Ok(self.groups().await?)
    }

    async fn list_projects(&self, group_id: u64) -> std::result::Result<Vec<Project>, FetchError> {
        Ok(self.group_projects(group_id).await?)
    }

    async fn list_branches(&self, project_id: u64) -> std::result::Result<Vec<Branch>, FetchError> {
        Ok(self.project_branches(project_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client(base_url: &str, options: ClientOptions) -> GitLabClient {
        GitLabClient::new(base_url, "glpat-secret", options)
            .unwrap()
            .with_http_client(reqwest::Client::builder().no_proxy().build().unwrap())
    }

    fn response(status: &str, extra_headers: &[(&str, &str)], body: &str) -> String {
        let mut head = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
            status,
            body.len()
        );
        for (name, value) in extra_headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        format!("{}\r\n{}", head, body)
    }

    /// Serve the canned responses in order, one connection each, recording request lines
    async fn serve(responses: Vec<String>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);

        tokio::spawn(async move {
            for canned in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 16 * 1024];
                let n = socket.read(&mut buf).await.unwrap();
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let line = request.lines().next().unwrap_or_default().to_string();
                recorder.lock().unwrap().push(line);
                socket.write_all(canned.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), seen)
    }

    #[test]
    fn test_page_url() {
        let c = client("https://gitlab.example.com/gitlab/", ClientOptions::default());
        let url = c.page_url("groups/7/projects", 3).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gitlab.example.com/gitlab/api/v4/groups/7/projects?private_token=glpat-secret&per_page=100&page=3"
        );
    }

    #[test]
    fn test_per_page_clamped() {
        let options = ClientOptions {
            per_page: 500,
            ..Default::default()
        };
        let c = client("https://gitlab.example.com", options);
        let url = c.page_url("groups", 1).unwrap();
        assert!(url.as_str().contains("per_page=100"));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            GitLabClient::new("gitlab.example.com", "t", ClientOptions::default()),
            Err(GitLabError::InvalidUrl(_))
        ));
        assert!(GitLabClient::new("ftp://gitlab.example.com", "t", ClientOptions::default()).is_err());
    }

    #[test]
    fn test_debug_hides_token() {
        let c = client("https://gitlab.example.com", ClientOptions::default());
        assert!(!format!("{:?}", c).contains("glpat-secret"));
    }

    #[test]
    fn test_next_page_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(next_page(&headers), None);

        headers.insert("x-next-page", HeaderValue::from_static(""));
        assert_eq!(next_page(&headers), None);

        headers.insert("x-next-page", HeaderValue::from_static("2"));
        assert_eq!(next_page(&headers), Some(2));

        headers.insert("x-next-page", HeaderValue::from_static("soon"));
        assert_eq!(next_page(&headers), None);
    }

    #[tokio::test]
    async fn test_follows_next_page() {
        let (base, seen) = serve(vec![
            response("200 OK", &[("X-Next-Page", "2")], r#"[{"id":1,"name":"a","path":"a"}]"#),
            response("200 OK", &[("X-Next-Page", "")], r#"[{"id":2,"name":"b","path":"b"}]"#),
        ])
        .await;

        let groups = client(&base, ClientOptions::default()).list_groups().await.unwrap();

        assert_eq!(groups.iter().map(|g| g.id).collect::<Vec<_>>(), vec![1, 2]);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].starts_with("GET /api/v4/groups?private_token=glpat-secret&per_page=100&page=1 "));
        assert!(seen[1].contains("page=2"));
    }

    #[tokio::test]
    async fn test_pagination_disabled_reads_first_page_only() {
        let (base, seen) = serve(vec![response(
            "200 OK",
            &[("X-Next-Page", "2")],
            r#"[{"name":"master","default":true}]"#,
        )])
        .await;

        let options = ClientOptions {
            paginate: false,
            ..Default::default()
        };
        let branches = client(&base, options).list_branches(9).await.unwrap();

        assert_eq!(branches.len(), 1);
        assert!(branches[0].is_default);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(seen.lock().unwrap()[0].contains("/api/v4/projects/9/repository/branches?"));
    }

    #[tokio::test]
    async fn test_max_pages_bound() {
        let (base, seen) = serve(vec![
            response("200 OK", &[("X-Next-Page", "2")], "[]"),
            response("200 OK", &[("X-Next-Page", "3")], "[]"),
        ])
        .await;

        let options = ClientOptions {
            max_pages: 2,
            ..Default::default()
        };
        let projects = client(&base, options).list_projects(3).await.unwrap();

        assert!(projects.is_empty());
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_non_200_is_status_error() {
        let (base, _) = serve(vec![response(
            "404 Not Found",
            &[],
            r#"{"message":"404 Group Not Found"}"#,
        )])
        .await;

        let err = client(&base, ClientOptions::default())
            .list_projects(77)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                status: 404,
                message: "404 Group Not Found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_bad_json_is_decode_error() {
        let (base, _) = serve(vec![response("200 OK", &[], r#"{"not":"a list"}"#)]).await;

        let err = client(&base, ClientOptions::default())
            .list_groups()
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_transport_error_hides_token() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr), ClientOptions::default())
            .list_groups()
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)));
        assert!(!err.to_string().contains("glpat-secret"));
    }
}
