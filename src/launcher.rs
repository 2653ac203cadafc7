//! NeosVR 프로세스 기동
//!
//! `neos.exe`를 설치 루트를 작업 디렉터리로 하여 실행한다. 플러그인 로드
//! 플래그가 항상 먼저 오고, 사용자 추가 인자는 트리밍 후 단일 인자 블롭으로
//! 뒤에 붙는다 (셸 토큰화 없음). 기동에 성공한 경우에만 사용한 인자를
//! 설정에 되써서 다음 실행의 기본값으로 남긴다.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::{PreferenceStore, Preferences};
use crate::error::LauncherError;
use crate::NEOS_EXECUTABLE;

/// 프로세스 인자 구성
///
/// `-LoadAssembly <dll>` 뒤에 트리밍된 추가 인자 하나. 추가 인자가 비어
/// 있으면 아무것도 붙이지 않는다.
pub fn build_arguments(plugin_dll: &Path, extra_arguments: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "-LoadAssembly".to_string(),
        plugin_dll.to_string_lossy().into_owned(),
    ];

    if let Some(extra) = extra_arguments {
        let trimmed = extra.trim();
        if !trimmed.is_empty() {
            args.push(trimmed.to_string());
        }
    }

    args
}

/// NeosVR 기동 + 성공 시 인자 기억
pub fn launch(
    install_root: &Path,
    plugin_dll: &Path,
    extra_arguments: Option<&str>,
    store: &PreferenceStore,
    prefs: &mut Preferences,
) -> Result<(), LauncherError> {
    let exe = install_root.join(NEOS_EXECUTABLE);
    let args = build_arguments(plugin_dll, extra_arguments);

    tracing::info!(
        "[Launcher] Starting {} {:?} (cwd: {})",
        exe.display(),
        args,
        install_root.display()
    );

    let mut cmd = Command::new(&exe);
    cmd.args(&args)
        .current_dir(install_root)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        // DETACHED_PROCESS | CREATE_BREAKAWAY_FROM_JOB | CREATE_NEW_PROCESS_GROUP
        cmd.creation_flags(0x00000008 | 0x01000000 | 0x00000200);
    }

    cmd.spawn().map_err(|e| LauncherError::LaunchFailed {
        executable: exe.to_string_lossy().into_owned(),
        source: e,
    })?;

    // 기동 성공 후에만 인자 보존 — 실패한 실행의 인자를 기억하지 않는다
    let remembered = extra_arguments.map(str::trim).filter(|s| !s.is_empty());
    prefs.launcher_arguments = remembered.map(str::to_string);
    store.save(prefs)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn arguments_start_with_load_assembly() {
        let dll = PathBuf::from("/neos/Libraries/NeosPlus/NeosPlus.dll");
        let args = build_arguments(&dll, None);
        assert_eq!(
            args,
            vec![
                "-LoadAssembly".to_string(),
                "/neos/Libraries/NeosPlus/NeosPlus.dll".to_string()
            ]
        );
    }

    #[test]
    fn extra_arguments_are_trimmed_and_appended() {
        let dll = PathBuf::from("NeosPlus.dll");
        let args = build_arguments(&dll, Some("  -Foo  "));
        assert_eq!(args.last().unwrap(), "-Foo");
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn empty_extra_arguments_add_nothing() {
        let dll = PathBuf::from("NeosPlus.dll");
        assert_eq!(build_arguments(&dll, Some("")).len(), 2);
        assert_eq!(build_arguments(&dll, Some("   ")).len(), 2);
    }

    #[test]
    fn missing_executable_fails_without_touching_prefs() {
        let tmp = TempDir::new().unwrap();
        let store = PreferenceStore::at(tmp.path().join("Config.json"));
        let mut prefs = Preferences {
            launcher_arguments: Some("-Old".into()),
            custom_install_dir: None,
        };

        let result = launch(
            tmp.path(),
            &tmp.path().join("NeosPlus.dll"),
            Some("-New"),
            &store,
            &mut prefs,
        );

        assert!(matches!(result, Err(LauncherError::LaunchFailed { .. })));
        assert_eq!(prefs.launcher_arguments.as_deref(), Some("-Old"));
        assert!(!store.path().exists(), "no preference write on failure");
    }

    #[cfg(unix)]
    #[test]
    fn successful_launch_persists_trimmed_arguments() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let exe = tmp.path().join(NEOS_EXECUTABLE);
        std::fs::write(&exe, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let store = PreferenceStore::at(tmp.path().join("Config.json"));
        let mut prefs = Preferences::default();

        launch(
            tmp.path(),
            &tmp.path().join("NeosPlus.dll"),
            Some("  -Screen  "),
            &store,
            &mut prefs,
        )
        .unwrap();

        assert_eq!(prefs.launcher_arguments.as_deref(), Some("-Screen"));
        assert_eq!(store.load(), prefs);
    }
}
