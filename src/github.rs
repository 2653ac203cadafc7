//! GitHub Release API 클라이언트
//!
//! 고정된 리포지토리의 최신 공개 릴리스 태그와 첫 번째 에셋 URL을 가져오고,
//! 에셋을 스테이징 파일로 스트리밍 다운로드한다. 릴리스 정보는 실행마다
//! 새로 조회하며 캐시하지 않는다.

use std::path::Path;

use futures_util::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use crate::error::{DownloadError, ReleaseError};

/// GitHub Release 응답 (필요한 필드만)
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    pub tag_name: String,
    pub name: Option<String>,
    pub prerelease: bool,
    pub draft: bool,
    pub published_at: Option<String>,
    pub assets: Vec<GitHubAsset>,
}

/// GitHub Release Asset
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAsset {
    pub name: String,
    pub size: u64,
    pub browser_download_url: String,
}

/// 최신 릴리스의 식별 정보 — 태그와 단일 에셋 다운로드 위치
#[derive(Debug, Clone)]
pub struct ReleaseInfo {
    pub tag_name: String,
    pub asset_name: String,
    pub download_url: String,
}

/// GitHub API 클라이언트
pub struct GitHubClient {
    owner: String,
    repo: String,
    http: reqwest::Client,
    /// API 베이스 URL (기본: "https://api.github.com")
    /// 로컬 mock 서버 테스트 시 "http://127.0.0.1:9876" 등으로 오버라이드
    base_url: String,
}

impl GitHubClient {
    pub fn new(owner: &str, repo: &str) -> Self {
        Self::with_base_url(owner, repo, None)
    }

    /// base_url을 오버라이드할 수 있는 생성자 (테스트/mock 서버용)
    pub fn with_base_url(owner: &str, repo: &str, base_url: Option<&str>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("neosplus-launcher/0.1")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client for launcher");

        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            http,
            base_url: base_url
                .filter(|s| !s.trim().is_empty())
                .unwrap_or("https://api.github.com")
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// 최신 공개 릴리스의 태그와 첫 에셋 URL 조회
    ///
    /// 404는 "공개된 릴리스 없음", 에셋 없는 릴리스는 `MalformedRelease`로
    /// 구분해서 반환한다. 어느 쪽이든 호출자는 기존 설치를 건드리면 안 된다.
    pub async fn latest_release(&self) -> Result<ReleaseInfo, ReleaseError> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.base_url, self.owner, self.repo
        );

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ReleaseError::NoReleaseFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReleaseError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let release: GitHubRelease = response.json().await?;
        tracing::info!(
            "[GitHub] Latest release: {} (published: {})",
            release.tag_name,
            release.published_at.as_deref().unwrap_or("unknown")
        );

        release_info(release)
    }

    /// 에셋을 파일로 다운로드 (스트리밍)
    ///
    /// 대상 경로에는 스테이징 이름을 넘겨야 한다 — 정식 플러그인 경로로 직접
    /// 받으면 부분 쓰기가 설치를 망가뜨린다.
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        tracing::info!("[GitHub] Downloading {} -> {}", url, dest.display());

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::info!("[GitHub] Downloaded {} bytes", written);
        Ok(())
    }
}

fn release_info(release: GitHubRelease) -> Result<ReleaseInfo, ReleaseError> {
    let tag_name = release.tag_name;
    match release.assets.into_iter().next() {
        Some(asset) => Ok(ReleaseInfo {
            tag_name,
            asset_name: asset.name,
            download_url: asset.browser_download_url,
        }),
        None => Err(ReleaseError::MalformedRelease { tag: tag_name }),
    }
}
