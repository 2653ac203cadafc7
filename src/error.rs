//! 런처 에러 타입 — 단계별 실패 원인 구분
//!
//! ## 실패 처리 원칙
//! - 자동 재시도 없음: 모든 실패는 한 번 표시되고 플로우가 종료됨
//! - fail-closed: 릴리스 확인/다운로드 실패 시 기존 설치를 절대 건드리지 않음

use std::path::PathBuf;
use thiserror::Error;

/// 릴리스 피드 조회 단계의 에러
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// 네트워크 연결 실패 또는 타임아웃
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 리포지토리에 공개된 릴리스가 없음
    #[error("repository has no published release")]
    NoReleaseFound,

    /// 릴리스는 있으나 다운로드 가능한 에셋이 없음
    #[error("release '{tag}' has no downloadable asset")]
    MalformedRelease { tag: String },

    /// GitHub API 응답 오류 (rate limit 등)
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// 에셋 다운로드 단계의 에러
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// 비정상 HTTP 응답 — 스테이징 파일은 승격되지 않음
    #[error("server returned status {0}")]
    Status(u16),

    #[error("failed to write staged file: {0}")]
    Io(#[from] std::io::Error),
}

/// 런처 최상위 에러
#[derive(Error, Debug)]
pub enum LauncherError {
    /// 설치 후보 없음 + 사용자 선택 거부/취소
    #[error("no NeosVR installation found")]
    InstallationNotFound,

    #[error("release check failed: {0}")]
    ReleaseCheck(#[from] ReleaseError),

    #[error("download failed: {0}")]
    DownloadFailed(#[from] DownloadError),

    /// 다른 런처 인스턴스가 같은 설치 디렉터리를 갱신 중
    #[error("another launcher instance is updating this installation")]
    UpdateLocked,

    #[error("failed to start '{executable}': {source}")]
    LaunchFailed {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    #[error("file system error during {operation} on '{path}': {source}")]
    FileSystem {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LauncherError {
    /// IO 에러를 파일시스템 에러로 변환하는 헬퍼
    pub fn fs(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::FileSystem {
            operation,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_failure_detail() {
        let err = ReleaseError::MalformedRelease { tag: "v1.2.0".into() };
        assert_eq!(err.to_string(), "release 'v1.2.0' has no downloadable asset");

        let err = DownloadError::Status(503);
        assert_eq!(err.to_string(), "server returned status 503");
    }

    #[test]
    fn fs_helper_keeps_operation_and_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = LauncherError::fs("rename", "/tmp/NeosPlus.dll", io);
        let msg = err.to_string();
        assert!(msg.contains("rename"));
        assert!(msg.contains("NeosPlus.dll"));
    }
}
