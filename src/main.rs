use std::io::{BufRead, Write};
use std::path::PathBuf;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use neosplus_launcher::i18n::{self, Locale};
use neosplus_launcher::{
    DirectoryPicker, GitHubClient, Orchestrator, PreferenceStore, REPOSITORY_NAME,
    REPOSITORY_OWNER,
};

/// 표준 입력으로 설치 디렉터리를 묻는 대화형 선택기
struct StdinDirectoryPicker {
    prompt: String,
}

impl DirectoryPicker for StdinDirectoryPicker {
    fn pick_directory(&self) -> Option<PathBuf> {
        println!("{}", self.prompt);
        print!("> ");
        std::io::stdout().flush().ok()?;

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).ok()?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let path = PathBuf::from(trimmed);
        if path.is_dir() {
            Some(path)
        } else {
            tracing::warn!("[Main] Selected path is not a directory: {}", path.display());
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 콘솔 + 실행별 로그 파일 (log-<시각>.txt)
    let log_name = format!("log-{}.txt", chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
    let (file_writer, _guard) = tracing_appender::non_blocking(
        tracing_appender::rolling::never(".", log_name),
    );
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    let locale = Locale::load(&i18n::system_language());

    // 커맨드라인 인자는 통째로 추가 기동 인자 — 없으면 기억된 값 사용
    let args: Vec<String> = std::env::args().skip(1).collect();
    let extra_arguments = if args.is_empty() {
        None
    } else {
        Some(args.join(" "))
    };

    // GitHub API 오버라이드 (로컬 mock 서버 테스트용)
    let api_base = std::env::var("NEOSPLUS_API_URL").ok();
    let client = GitHubClient::with_base_url(REPOSITORY_OWNER, REPOSITORY_NAME, api_base.as_deref());

    let picker = StdinDirectoryPicker {
        prompt: locale.t("SelectDirectory"),
    };
    let mut orchestrator = Orchestrator::new(client, PreferenceStore::new())
        .with_picker(Box::new(picker));

    // 단계 이벤트를 로케일 문자열로 표시
    let mut events = orchestrator.subscribe();
    let printer_locale = locale.clone();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("{}", printer_locale.t(event.locale_key()));
        }
    });

    let result = orchestrator.run(extra_arguments.as_deref()).await;
    drop(orchestrator); // 이벤트 채널 닫기 → printer 종료
    let _ = printer.await;

    match result {
        Ok(outcome) => {
            tracing::info!(
                "[Main] Launched with NeosPlus {} (updated this run: {})",
                outcome.latest_tag,
                outcome.updated
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("[Main] {}", e);
            Err(e.into())
        }
    }
}
