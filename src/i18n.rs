//! 상태 문자열 다국어 지원 — `Locale/{lang}.json` 로드
//!
//! 로케일 파일은 단계 키 → 표시 문자열의 평면 맵이다:
//! ```json
//! { "CheckingForUpdates": "Checking for updates...", "Done": "Done!" }
//! ```
//! 현재 로케일에 키가 없으면 `en`으로, 거기에도 없으면 키 자체로 폴백한다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 로케일 문자열 테이블
#[derive(Debug, Clone, Default)]
pub struct Locale {
    data: HashMap<String, String>,
    fallback: HashMap<String, String>,
}

impl Locale {
    /// 로케일 로드 (폴백: en)
    pub fn load(lang: &str) -> Self {
        let data = load_locale(lang).unwrap_or_default();
        let fallback = if lang == "en" {
            data.clone()
        } else {
            load_locale("en").unwrap_or_default()
        };
        Self { data, fallback }
    }

    /// 테스트/고정 테이블용 생성자
    pub fn from_maps(
        data: HashMap<String, String>,
        fallback: HashMap<String, String>,
    ) -> Self {
        Self { data, fallback }
    }

    /// 키로 문자열 조회 — 미등록 키는 키 자체를 반환
    pub fn t(&self, key: &str) -> String {
        self.data
            .get(key)
            .or_else(|| self.fallback.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// 시스템 언어 감지 ($LANG, 예: "ko_KR.UTF-8" → "ko-KR")
pub fn system_language() -> String {
    std::env::var("LANG")
        .ok()
        .and_then(|lang| {
            let tag = lang.split('.').next().unwrap_or("").replace('_', "-");
            if tag.is_empty() || tag == "C" {
                None
            } else {
                Some(tag)
            }
        })
        .unwrap_or_else(|| "en".to_string())
}

fn load_locale(lang: &str) -> Option<HashMap<String, String>> {
    // 1. 작업 디렉터리의 Locale/{lang}.json
    if let Some(map) = read_locale_file(&Path::new("Locale").join(format!("{}.json", lang))) {
        return Some(map);
    }

    // 2. 실행 파일 옆의 Locale/{lang}.json (배포용)
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let path = dir.join("Locale").join(format!("{}.json", lang));
            if let Some(map) = read_locale_file(&path) {
                return Some(map);
            }
        }
    }

    // 3. "ko-KR" → "ko" 같은 언어-only 폴백
    if let Some((short, _)) = lang.split_once('-') {
        return load_locale(short);
    }

    None
}

fn read_locale_file(path: &PathBuf) -> Option<HashMap<String, String>> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(map) => Some(map),
        Err(e) => {
            tracing::warn!("[I18n] Malformed locale file {}: {}", path.display(), e);
            None
        }
    }
}
