//! 플러그인 설치 레이아웃과 원자적 교체
//!
//! ## 디렉터리 구조 (설치 루트 기준)
//! - `Libraries/NeosPlus/version.txt` — 설치된 버전 태그 (UTF-8 평문)
//! - `Libraries/NeosPlus/NeosPlus.dll` — 설치된 플러그인 바이너리
//! - `Libraries/NeosPlus/NeosPlus_<tag>.dll` — 다운로드 중의 스테이징 파일
//!
//! ## 교체 순서 불변식
//! 바이너리 승격(rename)이 버전 마커 기록보다 **먼저**다. 두 쓰기 사이에서
//! 크래시가 나면 마커는 이전 값으로 남고, 다음 실행에서 "업데이트 필요"로
//! 재감지된다. 반대 순서라면 마커가 존재하지 않는 바이너리를 가리키게 된다.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;

use crate::error::LauncherError;
use crate::PLUGIN_NAME;

/// 설치 루트 아래의 플러그인 파일 배치
pub struct PluginInstall {
    plugin_dir: PathBuf,
}

impl PluginInstall {
    pub fn new(install_root: &Path) -> Self {
        Self {
            plugin_dir: install_root.join("Libraries").join(PLUGIN_NAME),
        }
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// 정식 플러그인 바이너리 경로
    pub fn dll_path(&self) -> PathBuf {
        self.plugin_dir.join(format!("{}.dll", PLUGIN_NAME))
    }

    /// 버전 마커 파일 경로
    pub fn version_file(&self) -> PathBuf {
        self.plugin_dir.join("version.txt")
    }

    /// 태그별 스테이징 파일 경로 (정식 이름과 절대 겹치지 않음)
    pub fn staged_path(&self, tag: &str) -> PathBuf {
        self.plugin_dir.join(format!("{}_{}.dll", PLUGIN_NAME, tag))
    }

    /// 플러그인 디렉터리 생성 (이미 있으면 no-op)
    pub fn ensure_dir(&self) -> Result<(), LauncherError> {
        std::fs::create_dir_all(&self.plugin_dir)
            .map_err(|e| LauncherError::fs("create_dir", &self.plugin_dir, e))
    }

    /// 설치된 버전 태그 — 마커가 없으면 빈 문자열 ("미설치")
    pub fn installed_version(&self) -> String {
        std::fs::read_to_string(self.version_file()).unwrap_or_default()
    }

    /// 업데이트 필요 여부
    ///
    /// 마커 불일치 또는 바이너리 부재. 바이너리 존재는 마커와 무관하게 따로
    /// 확인한다 — 마커만 앞서 쓰인 과거 실패 흔적을 신뢰하지 않기 위해서다.
    pub fn update_required(&self, latest_tag: &str) -> bool {
        self.installed_version() != latest_tag || !self.dll_path().exists()
    }

    /// 스테이징 파일을 정식 이름으로 승격하고 버전 마커를 갱신
    ///
    /// 기존 바이너리 삭제 → rename → 마커 기록 순서. 마커 기록은 반드시
    /// rename 성공 뒤에만 수행한다 (모듈 문서의 순서 불변식).
    pub fn promote(&self, staged: &Path, tag: &str) -> Result<(), LauncherError> {
        let dll = self.dll_path();
        if dll.exists() {
            std::fs::remove_file(&dll).map_err(|e| LauncherError::fs("remove", &dll, e))?;
        }
        std::fs::rename(staged, &dll).map_err(|e| LauncherError::fs("rename", staged, e))?;

        let marker = self.version_file();
        std::fs::write(&marker, tag).map_err(|e| LauncherError::fs("write", &marker, e))?;

        tracing::info!("[Install] Promoted {} (version {})", dll.display(), tag);
        Ok(())
    }

    /// 실패한 다운로드의 스테이징 파일 정리 (best-effort)
    pub fn discard_staged(&self, staged: &Path) {
        if staged.exists() {
            if let Err(e) = std::fs::remove_file(staged) {
                tracing::warn!(
                    "[Install] Failed to clean up staged file {}: {}",
                    staged.display(),
                    e
                );
            }
        }
    }
}

/// 설치 디렉터리별 업데이트 잠금
///
/// 두 런처 인스턴스가 동시에 실행되면 스테이징 파일 이름과 정식 경로에서
/// 경합한다. OS 수준 advisory 잠금으로 다운로드~승격 구간을 상호 배제한다.
/// 드롭 시 잠금이 풀리고 잠금 파일은 제거된다.
pub struct UpdateLock {
    _file: File,
    lock_path: PathBuf,
}

impl UpdateLock {
    /// 잠금 획득 시도 — 이미 다른 인스턴스가 잡고 있으면 `UpdateLocked`
    pub fn acquire(plugin_dir: &Path) -> Result<Self, LauncherError> {
        let lock_path = plugin_dir.join(".update.lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LauncherError::fs("open", &lock_path, e))?;

        match file.try_lock_exclusive() {
            Ok(true) => {
                tracing::debug!("[Install] Update lock acquired: {}", lock_path.display());
                Ok(Self {
                    _file: file,
                    lock_path,
                })
            }
            Ok(false) => Err(LauncherError::UpdateLocked),
            Err(e) => Err(LauncherError::fs("lock", &lock_path, e)),
        }
    }
}

impl Drop for UpdateLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.lock_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(
                    "[Install] Failed to remove lock file {}: {}",
                    self.lock_path.display(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn install_in(tmp: &TempDir) -> PluginInstall {
        let install = PluginInstall::new(tmp.path());
        install.ensure_dir().unwrap();
        install
    }

    #[test]
    fn layout_paths() {
        let tmp = TempDir::new().unwrap();
        let install = PluginInstall::new(tmp.path());
        assert!(install.dll_path().ends_with("Libraries/NeosPlus/NeosPlus.dll"));
        assert!(install.version_file().ends_with("Libraries/NeosPlus/version.txt"));
        assert!(install
            .staged_path("v1.7.2")
            .ends_with("Libraries/NeosPlus/NeosPlus_v1.7.2.dll"));
    }

    #[test]
    fn installed_version_empty_when_absent() {
        let tmp = TempDir::new().unwrap();
        let install = install_in(&tmp);
        assert_eq!(install.installed_version(), "");
    }

    #[test]
    fn update_required_matrix() {
        let tmp = TempDir::new().unwrap();
        let install = install_in(&tmp);

        // 미설치
        assert!(install.update_required("v1.0.0"));

        // 마커와 바이너리가 모두 맞으면 불필요
        std::fs::write(install.dll_path(), b"dll").unwrap();
        std::fs::write(install.version_file(), "v1.0.0").unwrap();
        assert!(!install.update_required("v1.0.0"));

        // 태그가 다르면 필요 (다운그레이드 포함 — 문자열 불일치 기준)
        assert!(install.update_required("v1.1.0"));

        // 마커는 맞는데 바이너리가 사라진 경우에도 필요
        std::fs::remove_file(install.dll_path()).unwrap();
        assert!(install.update_required("v1.0.0"));
    }

    #[test]
    fn promote_replaces_binary_then_marker() {
        let tmp = TempDir::new().unwrap();
        let install = install_in(&tmp);

        std::fs::write(install.dll_path(), b"old").unwrap();
        std::fs::write(install.version_file(), "v1.0.0").unwrap();

        let staged = install.staged_path("v1.1.0");
        std::fs::write(&staged, b"new").unwrap();

        install.promote(&staged, "v1.1.0").unwrap();

        assert_eq!(std::fs::read(install.dll_path()).unwrap(), b"new");
        assert_eq!(install.installed_version(), "v1.1.0");
        assert!(!staged.exists(), "staged file must be gone after rename");
    }

    #[test]
    fn discard_staged_is_silent_on_missing_file() {
        let tmp = TempDir::new().unwrap();
        let install = install_in(&tmp);
        install.discard_staged(&install.staged_path("v9.9.9"));
    }

    #[test]
    fn second_lock_acquisition_fails_while_held() {
        let tmp = TempDir::new().unwrap();
        let install = install_in(&tmp);

        let first = UpdateLock::acquire(install.plugin_dir()).unwrap();
        match UpdateLock::acquire(install.plugin_dir()) {
            Err(LauncherError::UpdateLocked) => {}
            other => panic!("expected UpdateLocked, got {:?}", other.err()),
        }
        drop(first);

        // 해제 후에는 다시 획득 가능
        let _second = UpdateLock::acquire(install.plugin_dir()).unwrap();
    }
}
