//! 업데이트-기동 오케스트레이션 상태 머신
//!
//! ## 플로우
//! `Idle → LocatingInstall → CheckingVersion → Downloading → Installing →
//! Launching → Done`, 실패는 `Done`을 제외한 모든 상태에서 `Failed`로.
//! 업데이트가 불필요하면 `CheckingVersion`에서 곧장 `Launching`으로 건너뛴다.
//!
//! ## 표시 계층 연동
//! 각 주요 전이마다 단계 이벤트를 브로드캐스트한다. 프레젠테이션 계층(CLI)은
//! 구독한 이벤트를 로케일 키로 변환해 표시하고, 설치 후보가 없을 때의
//! 대화형 디렉터리 선택을 `DirectoryPicker`로 공급한다.

use std::path::PathBuf;

use tokio::sync::broadcast;

use crate::config::{PreferenceStore, Preferences};
use crate::error::LauncherError;
use crate::github::GitHubClient;
use crate::install::{PluginInstall, UpdateLock};
use crate::{launcher, paths};

/// 오케스트레이터 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Idle,
    LocatingInstall,
    CheckingVersion,
    Downloading,
    Installing,
    Launching,
    Done,
    Failed,
}

impl LaunchState {
    pub fn can_transition(self, to: LaunchState) -> bool {
        use LaunchState::*;
        matches!(
            (self, to),
            (Idle, LocatingInstall)
                | (LocatingInstall, CheckingVersion)
                | (CheckingVersion, Downloading)
                | (CheckingVersion, Launching)
                | (Downloading, Installing)
                | (Installing, Launching)
                | (Launching, Done)
        ) || (to == Failed && self != Done)
    }
}

/// 표시 계층에 브로드캐스트되는 단계 이벤트
#[derive(Debug, Clone)]
pub enum StatusEvent {
    CheckingUpdates,
    Downloading { tag: String },
    NoInstallFound,
    DownloadFailed,
    Starting,
    Done,
}

impl StatusEvent {
    /// 로케일 파일(`Locale/<lang>.json`)에서 사용하는 키
    pub fn locale_key(&self) -> &'static str {
        match self {
            StatusEvent::CheckingUpdates => "CheckingForUpdates",
            StatusEvent::Downloading { .. } => "DownloadingNeosPlus",
            StatusEvent::NoInstallFound => "NoNeosDirectory",
            StatusEvent::DownloadFailed => "FailedToDownloadNeosPlus",
            StatusEvent::Starting => "StartingNeosWithNeosPlus",
            StatusEvent::Done => "Done",
        }
    }
}

/// 설치 후보가 없을 때 표시 계층이 공급하는 대화형 디렉터리 선택
///
/// `None`은 사용자의 거부/취소를 뜻하며, 이 경우 플로우는 부작용 없이
/// `InstallationNotFound`로 끝난다.
pub trait DirectoryPicker: Send + Sync {
    fn pick_directory(&self) -> Option<PathBuf>;
}

/// 기동 준비 결과 — 설치 루트와 플러그인 경로
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub install_root: PathBuf,
    pub plugin_dll: PathBuf,
    pub latest_tag: String,
    /// 이번 실행에서 다운로드-설치가 수행되었는지
    pub updated: bool,
}

/// 전체 플로우 결과
#[derive(Debug, Clone)]
pub struct LaunchOutcome {
    pub latest_tag: String,
    pub updated: bool,
}

/// 업데이트-기동 오케스트레이터
pub struct Orchestrator {
    client: GitHubClient,
    store: PreferenceStore,
    picker: Option<Box<dyn DirectoryPicker>>,
    status_tx: broadcast::Sender<StatusEvent>,
    state: LaunchState,
}

impl Orchestrator {
    pub fn new(client: GitHubClient, store: PreferenceStore) -> Self {
        let (status_tx, _) = broadcast::channel(32);
        Self {
            client,
            store,
            picker: None,
            status_tx,
            state: LaunchState::Idle,
        }
    }

    pub fn with_picker(mut self, picker: Box<dyn DirectoryPicker>) -> Self {
        self.picker = Some(picker);
        self
    }

    /// 단계 이벤트 구독
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.status_tx.subscribe()
    }

    pub fn state(&self) -> LaunchState {
        self.state
    }

    fn report(&self, event: StatusEvent) {
        tracing::debug!("[Orchestrator] Status: {:?}", event);
        let _ = self.status_tx.send(event);
    }

    fn enter(&mut self, to: LaunchState) {
        debug_assert!(
            self.state.can_transition(to),
            "invalid transition: {:?} -> {:?}",
            self.state,
            to
        );
        tracing::debug!("[Orchestrator] {:?} -> {:?}", self.state, to);
        self.state = to;
    }

    fn fail(&mut self, err: LauncherError) -> LauncherError {
        self.enter(LaunchState::Failed);
        tracing::error!("[Orchestrator] {}", err);
        err
    }

    /// 전체 플로우: 설정 로드 → 준비(탐지/확인/설치) → 기동
    ///
    /// `extra_arguments`가 `None`이면 기억된 `LauncherArguments`를 사용한다.
    pub async fn run(
        &mut self,
        extra_arguments: Option<&str>,
    ) -> Result<LaunchOutcome, LauncherError> {
        let mut prefs = self.store.load();
        let plan = self.prepare(&mut prefs).await?;

        self.enter(LaunchState::Launching);
        self.report(StatusEvent::Starting);

        let extra = extra_arguments
            .map(str::to_string)
            .or_else(|| prefs.launcher_arguments.clone());
        if let Err(e) = launcher::launch(
            &plan.install_root,
            &plan.plugin_dll,
            extra.as_deref(),
            &self.store,
            &mut prefs,
        ) {
            // 설치는 이미 커밋됨 — 기동 실패는 롤백하지 않는다
            return Err(self.fail(e));
        }

        self.enter(LaunchState::Done);
        self.report(StatusEvent::Done);
        Ok(LaunchOutcome {
            latest_tag: plan.latest_tag,
            updated: plan.updated,
        })
    }

    /// 설치 탐지 + 버전 확인 + 필요 시 다운로드/설치 (기동 제외)
    pub async fn prepare(
        &mut self,
        prefs: &mut Preferences,
    ) -> Result<LaunchPlan, LauncherError> {
        self.enter(LaunchState::LocatingInstall);
        self.report(StatusEvent::CheckingUpdates);

        let install_root = match paths::resolve_install_candidates(prefs).into_iter().next() {
            Some(dir) => dir,
            None => match self.picker.as_ref().and_then(|p| p.pick_directory()) {
                Some(dir) => {
                    // 선택 즉시 저장 — 다음 실행부터는 최우선 후보가 된다
                    prefs.custom_install_dir = Some(dir.to_string_lossy().into_owned());
                    if let Err(e) = self.store.save(prefs) {
                        return Err(self.fail(e));
                    }
                    dir
                }
                None => {
                    self.report(StatusEvent::NoInstallFound);
                    return Err(self.fail(LauncherError::InstallationNotFound));
                }
            },
        };
        tracing::info!("[Orchestrator] Install root: {}", install_root.display());

        self.enter(LaunchState::CheckingVersion);
        let install = PluginInstall::new(&install_root);
        if let Err(e) = install.ensure_dir() {
            return Err(self.fail(e));
        }

        let latest = match self.client.latest_release().await {
            Ok(info) => info,
            // fail-closed: 피드 확인이 실패하면 기존 설치를 그대로 둔다
            Err(e) => return Err(self.fail(e.into())),
        };
        tracing::info!(
            "[Orchestrator] Installed: '{}', latest: '{}'",
            install.installed_version(),
            latest.tag_name
        );

        let mut updated = false;
        if install.update_required(&latest.tag_name) {
            self.enter(LaunchState::Downloading);
            self.report(StatusEvent::Downloading {
                tag: latest.tag_name.clone(),
            });

            let _lock = match UpdateLock::acquire(install.plugin_dir()) {
                Ok(lock) => lock,
                Err(e) => return Err(self.fail(e)),
            };

            let staged = install.staged_path(&latest.tag_name);
            if let Err(e) = self.client.download_to(&latest.download_url, &staged).await {
                self.report(StatusEvent::DownloadFailed);
                install.discard_staged(&staged);
                return Err(self.fail(e.into()));
            }

            self.enter(LaunchState::Installing);
            if let Err(e) = install.promote(&staged, &latest.tag_name) {
                install.discard_staged(&staged);
                return Err(self.fail(e));
            }
            updated = true;
        } else {
            tracing::info!("[Orchestrator] Plugin is up to date, skipping download");
        }

        Ok(LaunchPlan {
            plugin_dll: install.dll_path(),
            install_root,
            latest_tag: latest.tag_name,
            updated,
        })
    }
}
