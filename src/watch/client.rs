//! Cluster API client: discovery and streaming watch requests.
//!
//! # Responsibilities
//! - Build an authenticated HTTP client (bearer token, CA, TLS options)
//! - Fall back to in-cluster service account settings
//! - Resolve a kind to its resource name via discovery
//! - Open `?watch=true` requests and decode the newline-delimited feed

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::{Stream, TryStreamExt};
use reqwest::{Certificate, Client, Response};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Split};
use tokio_util::io::StreamReader;
use url::Url;

use crate::config::ClusterConfig;
use crate::resource::GroupVersionResource;
use crate::watch::{WatchError, WatchEvent};

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Namespace and selectors narrowing a watch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchScope {
    /// Empty watches all namespaces.
    pub namespace: String,
    pub label_selector: String,
    pub field_selector: String,
}

/// Client for the cluster API server.
#[derive(Debug, Clone)]
pub struct ClusterClient {
    http: Client,
    server: Url,
    token: Option<String>,
}

impl ClusterClient {
    /// Build a client from configuration.
    ///
    /// Without an explicit server, the in-cluster service environment and
    /// service account files are used.
    pub fn from_config(config: &ClusterConfig) -> Result<Self, WatchError> {
        let in_cluster = config.server.is_none();
        let server = match &config.server {
            Some(server) => server.clone(),
            None => in_cluster_server()?,
        };
        let server: Url = server
            .parse()
            .map_err(|e| WatchError::Config(format!("invalid server URL '{}': {}", server, e)))?;

        let sa_file = |name: &str| -> Option<PathBuf> {
            let path = Path::new(SERVICE_ACCOUNT_DIR).join(name);
            (in_cluster && path.exists()).then_some(path)
        };

        let token = match (&config.token, config.token_file.clone().or_else(|| sa_file("token"))) {
            (Some(token), _) => Some(token.clone()),
            (None, Some(path)) => Some(read_file(&path)?.trim().to_string()),
            (None, None) => None,
        };

        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("phase-collector/", env!("CARGO_PKG_VERSION")));

        if let Some(ca_file) = config.ca_file.clone().or_else(|| sa_file("ca.crt")) {
            let pem = read_file(&ca_file)?;
            let certificate = Certificate::from_pem(pem.as_bytes())?;
            builder = builder.add_root_certificate(certificate);
        }

        if config.insecure_skip_tls_verify {
            tracing::warn!("TLS verification of the cluster API server is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            http: builder.build()?,
            server,
            token,
        })
    }

    pub fn server(&self) -> &Url {
        &self.server
    }

    /// Resolve `kind` to the resource name served under `group`/`version`.
    pub async fn resolve_kind(
        &self,
        group: &str,
        version: &str,
        kind: &str,
    ) -> Result<GroupVersionResource, WatchError> {
        let path = group_version_path(group, version);
        let response = self.send(self.get(&path)).await?;
        let list: ApiResourceList = response.json().await?;

        list.resources
            .into_iter()
            .find(|r| r.kind == kind && !r.name.contains('/'))
            .map(|r| GroupVersionResource::new(group, version, r.name))
            .ok_or_else(|| WatchError::KindNotFound {
                kind: kind.to_string(),
                group_version: path,
            })
    }

    /// Open a watch on `gvr`.
    ///
    /// The server first replays the current instances as `ADDED` events,
    /// then streams changes until it closes the connection.
    pub async fn watch(
        &self,
        gvr: &GroupVersionResource,
        scope: &WatchScope,
    ) -> Result<WatchStream, WatchError> {
        let mut query = vec![("watch", "true")];
        if !scope.label_selector.trim().is_empty() {
            query.push(("labelSelector", scope.label_selector.trim()));
        }
        if !scope.field_selector.trim().is_empty() {
            query.push(("fieldSelector", scope.field_selector.trim()));
        }

        let path = resource_path(gvr, &scope.namespace);
        let response = self.send(self.get(&path).query(&query)).await?;

        tracing::debug!(url = %response.url(), "Watch established");
        Ok(WatchStream::from_response(response))
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.http.get(self.endpoint(path));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.server.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}{}", prefix, path));
        url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, WatchError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(WatchError::Status { status, url, body })
    }
}

#[derive(Debug, Deserialize)]
struct ApiResourceList {
    #[serde(default)]
    resources: Vec<ApiResource>,
}

#[derive(Debug, Deserialize)]
struct ApiResource {
    name: String,
    kind: String,
}

fn in_cluster_server() -> Result<String, WatchError> {
    let host = std::env::var("KUBERNETES_SERVICE_HOST").map_err(|_| {
        WatchError::Config("no server configured and KUBERNETES_SERVICE_HOST is not set".to_string())
    })?;
    let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());

    if host.contains(':') {
        Ok(format!("https://[{}]:{}", host, port))
    } else {
        Ok(format!("https://{}:{}", host, port))
    }
}

fn read_file(path: &Path) -> Result<String, WatchError> {
    std::fs::read_to_string(path).map_err(|source| WatchError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// `/api/<version>` for the core group, `/apis/<group>/<version>` otherwise.
pub fn group_version_path(group: &str, version: &str) -> String {
    if group.is_empty() {
        format!("/api/{}", version)
    } else {
        format!("/apis/{}/{}", group, version)
    }
}

/// Collection path of `gvr`, scoped to `namespace` unless it is empty.
pub fn resource_path(gvr: &GroupVersionResource, namespace: &str) -> String {
    let base = group_version_path(&gvr.group, &gvr.version);
    if namespace.is_empty() {
        format!("{}/{}", base, gvr.resource)
    } else {
        format!("{}/namespaces/{}/{}", base, namespace, gvr.resource)
    }
}

type LineReader = Split<Box<dyn AsyncBufRead + Send + Unpin>>;

/// Newline-delimited watch feed.
///
/// Lines are split as raw bytes so that a malformed document only costs
/// its own event.
pub struct WatchStream {
    lines: LineReader,
}

impl WatchStream {
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        let reader: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(reader);
        Self { lines: reader.split(b'\n') }
    }

    fn from_response(response: Response) -> Self {
        let body = Box::pin(response.bytes_stream().map_err(io::Error::other));
        Self::from_reader(StreamReader::new(body))
    }

    /// Next event; `None` once the server closes the feed.
    pub async fn next_event(&mut self) -> Option<Result<WatchEvent, WatchError>> {
        loop {
            match self.lines.next_segment().await {
                Ok(Some(line)) if line.iter().all(u8::is_ascii_whitespace) => continue,
                Ok(Some(line)) => return Some(WatchEvent::from_line(&line)),
                Ok(None) => return None,
                Err(e) => return Some(Err(WatchError::Transport(e))),
            }
        }
    }

    /// Adapts the feed into a stream that ends after a transport failure.
    pub fn into_stream(self) -> impl Stream<Item = Result<WatchEvent, WatchError>> + Send + Unpin {
        Box::pin(futures_util::stream::unfold(Some(self), |state| async move {
            let mut watch = state?;
            match watch.next_event().await? {
                Err(e @ WatchError::Transport(_)) => Some((Err(e), None)),
                item => Some((item, Some(watch))),
            }
        }))
    }
}

impl std::fmt::Debug for WatchStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchStream").finish_non_exhaustive()
    }
}
