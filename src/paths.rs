//! NeosVR 설치 디렉터리 탐지
//!
//! 플랫폼별 기본 설치 경로 목록을 순회하고, 저장된 커스텀 디렉터리가 있으면
//! 최우선 순위로 앞에 붙인다. 실재하는 디렉터리만 후보로 남긴다.

use std::path::PathBuf;

use crate::config::Preferences;

/// 플랫폼별 기본 NeosVR 설치 경로 목록 (존재 여부는 아직 확인하지 않음)
pub fn default_install_candidates() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "windows")]
    {
        if let Some(program_files_x86) = std::env::var_os("ProgramFiles(x86)") {
            paths.push(
                PathBuf::from(program_files_x86)
                    .join("Steam")
                    .join("steamapps")
                    .join("common")
                    .join("NeosVR"),
            );
        }
        paths.push(PathBuf::from(r"C:\Neos\app"));

        // 추가 드라이브의 Steam 라이브러리
        for drive in &["C:", "D:", "E:", "F:"] {
            paths.push(PathBuf::from(format!(
                "{}\\SteamLibrary\\steamapps\\common\\NeosVR",
                drive
            )));
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home = PathBuf::from(home);
            paths.push(
                home.join(".steam")
                    .join("steam")
                    .join("steamapps")
                    .join("common")
                    .join("NeosVR"),
            );
            paths.push(
                home.join(".local")
                    .join("share")
                    .join("Steam")
                    .join("steamapps")
                    .join("common")
                    .join("NeosVR"),
            );
        }
        paths.push(PathBuf::from(
            "/mnt/LocalDisk/SteamLibrary/steamapps/common/NeosVR",
        ));
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("Steam")
                    .join("steamapps")
                    .join("common")
                    .join("NeosVR"),
            );
        }
    }

    paths
}

/// 설치 후보를 우선순위 순서로 반환
///
/// 커스텀 디렉터리가 설정되어 있고 실재하면 기본 경로들보다 항상 앞선다 —
/// 한 번 기억된 사용자의 선택이 기본값을 이긴다.
pub fn resolve_install_candidates(prefs: &Preferences) -> Vec<PathBuf> {
    candidates_from(&default_install_candidates(), prefs)
}

fn candidates_from(defaults: &[PathBuf], prefs: &Preferences) -> Vec<PathBuf> {
    let mut existing: Vec<PathBuf> = defaults.iter().filter(|p| p.is_dir()).cloned().collect();

    if let Some(ref custom) = prefs.custom_install_dir {
        let custom = PathBuf::from(custom);
        if custom.is_dir() {
            existing.insert(0, custom);
        } else {
            tracing::warn!(
                "[Paths] Stored custom install dir does not exist: {}",
                custom.display()
            );
        }
    }

    existing
}
