//! GitHub REST access: the recursive tree listing and blob downloads.

use std::io::{self, Write};

use base64::{engine::general_purpose, Engine as _};
use crossterm::{
    cursor::MoveToColumn,
    queue,
    terminal::{Clear, ClearType},
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::repo::{EntryKind, RemoteEntry};
use crate::session::RepoSpec;

/// Something that can download the content behind a remote locator.
#[allow(async_fn_in_trait)]
pub trait ContentSource {
    async fn fetch_content(&self, locator: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// HTTP client for the GitHub API.
pub struct GitHubClient {
    client: reqwest::Client,
    api_base: String,
    show_progress: bool,
}

impl GitHubClient {
    pub fn new(api_base: &str, user_agent: &str, show_progress: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::Fetch(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            show_progress,
        })
    }

    /// Fetch the full recursive file listing of a branch.
    pub async fn fetch_tree(&self, spec: &RepoSpec) -> Result<Vec<RemoteEntry>> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base, spec.owner, spec.repo, spec.branch
        );
        log::debug!("GET {}", url);
        let resp = self.send(&url).await?;
        let body = resp.bytes().await?;
        parse_tree(&body)
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::Fetch(format!(
                "{} not found (check owner, repository and branch)",
                url
            )));
        }
        if !status.is_success() {
            return Err(AppError::Fetch(format!("{} returned {}", url, status)));
        }
        Ok(resp)
    }
}

impl ContentSource for GitHubClient {
    async fn fetch_content(&self, locator: &str) -> Result<Vec<u8>> {
        log::debug!("GET {}", locator);
        let mut resp = self.send(locator).await?;
        let total = resp.content_length().filter(|&n| n > 0);
        let mut body = Vec::new();
        let mut stdout = io::stdout();
        while let Some(chunk) = resp.chunk().await? {
            body.extend_from_slice(&chunk);
            if let (true, Some(total)) = (self.show_progress, total) {
                let _ = show_percentage(&mut stdout, body.len() as u64, total);
            }
        }
        if self.show_progress && total.is_some() {
            let _ = clear_line(&mut stdout);
        }
        decode_blob(&body)
    }
}

fn show_percentage(out: &mut impl Write, current: u64, total: u64) -> io::Result<()> {
    clear_line(out)?;
    write!(out, "{:.2}%", current as f64 / total as f64 * 100.0)?;
    out.flush()
}

fn clear_line(out: &mut impl Write) -> io::Result<()> {
    queue!(out, Clear(ClearType::CurrentLine), MoveToColumn(0))?;
    out.flush()
}

/// Parse a recursive tree response into entries.
///
/// Submodule (`commit`) entries have no downloadable content and are skipped.
fn parse_tree(body: &[u8]) -> Result<Vec<RemoteEntry>> {
    let response: TreeResponse = serde_json::from_slice(body)?;
    if response.truncated {
        log::warn!("tree listing was truncated by the server; some files are missing");
    }
    let mut entries = Vec::with_capacity(response.tree.len());
    for item in response.tree {
        let kind = match item.kind.as_str() {
            "tree" => EntryKind::Directory,
            "blob" => EntryKind::File,
            other => {
                log::warn!("skipping {} entry {}", other, item.path);
                continue;
            }
        };
        entries.push(RemoteEntry {
            path: item.path,
            kind,
            locator: item.url.unwrap_or_default(),
        });
    }
    log::debug!("tree listing has {} entries", entries.len());
    Ok(entries)
}

/// Decode a blob response body to raw file bytes.
fn decode_blob(body: &[u8]) -> Result<Vec<u8>> {
    let blob: BlobResponse = serde_json::from_slice(body)?;
    match blob.encoding.as_deref() {
        None | Some("base64") => {
            let compact: String = blob
                .content
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| AppError::Fetch(format!("invalid base64 content: {}", e)))
        }
        Some("utf-8") => Ok(blob.content.into_bytes()),
        Some(other) => Err(AppError::Fetch(format!("unsupported encoding {}", other))),
    }
}
