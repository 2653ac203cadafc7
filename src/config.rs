//! 런처 설정 (`Assets/Config.json`) 로드/저장
//!
//! 키 이름은 기존 설정 파일과의 호환을 위해 PascalCase 고정:
//! `LauncherArguments`, `CustomInstallDir`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LauncherError;

/// 사용자 설정 — 마지막 실행 인자와 커스텀 설치 디렉터리
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(
        rename = "LauncherArguments",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub launcher_arguments: Option<String>,

    #[serde(
        rename = "CustomInstallDir",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_install_dir: Option<String>,
}

/// 설정 파일 저장소
///
/// 단일 사용자/단일 프로세스 도구이므로 잠금 없이 last-writer-wins로 덮어쓴다.
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// 기본 경로 (작업 디렉터리 기준 `Assets/Config.json`)
    pub fn new() -> Self {
        Self::at("Assets/Config.json")
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 설정 로드
    ///
    /// 파일이 없으면 빈 설정을 반환한다. 내용이 깨져 있어도 에러를 올리지 않고
    /// 경고 후 빈 설정으로 강등한다 — 설정 파싱 실패에서 의미 있게 복구할 수
    /// 있는 호출자가 없다.
    pub fn load(&self) -> Preferences {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Preferences::default();
            }
            Err(e) => {
                tracing::warn!("[Config] Failed to read {}: {}", self.path.display(), e);
                return Preferences::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(prefs) => prefs,
            Err(e) => {
                tracing::warn!(
                    "[Config] Malformed preferences at {}, falling back to defaults: {}",
                    self.path.display(),
                    e
                );
                Preferences::default()
            }
        }
    }

    /// 설정 저장 (무조건 덮어쓰기)
    pub fn save(&self, prefs: &Preferences) -> Result<(), LauncherError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LauncherError::fs("create_dir", parent, e))?;
            }
        }

        let json = serde_json::to_string_pretty(prefs)
            .map_err(|e| LauncherError::fs("serialize", &self.path, e.into()))?;
        std::fs::write(&self.path, json).map_err(|e| LauncherError::fs("write", &self.path, e))?;

        tracing::debug!("[Config] Saved preferences to {}", self.path.display());
        Ok(())
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let store = PreferenceStore::at(tmp.path().join("Config.json"));
        assert_eq!(store.load(), Preferences::default());
    }

    #[test]
    fn round_trip_preserves_both_fields() {
        let tmp = TempDir::new().unwrap();
        let store = PreferenceStore::at(tmp.path().join("Assets").join("Config.json"));

        let prefs = Preferences {
            launcher_arguments: Some("-Bar".into()),
            custom_install_dir: Some("/x/y".into()),
        };
        store.save(&prefs).unwrap();

        assert_eq!(store.load(), prefs);
    }

    #[test]
    fn serialized_keys_are_pascal_case() {
        let prefs = Preferences {
            launcher_arguments: Some("-Foo".into()),
            custom_install_dir: None,
        };
        let json = serde_json::to_string(&prefs).unwrap();
        assert!(json.contains("\"LauncherArguments\""));
        // 없는 값은 키 자체를 생략
        assert!(!json.contains("CustomInstallDir"));
    }

    #[test]
    fn malformed_content_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = PreferenceStore::at(&path);
        assert_eq!(store.load(), Preferences::default());
    }
}
