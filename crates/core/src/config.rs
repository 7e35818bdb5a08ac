//! 설정 관리 — gathering.toml 파싱 및 런타임 설정
//!
//! [`GatheringConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`GATHERING_UPLOAD_TOKEN=...` 형식)
//! 2. 설정 파일 (`gathering.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), gathering_core::error::GatheringError> {
//! use gathering_core::config::GatheringConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = GatheringConfig::load("gathering.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = GatheringConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, GatheringError};
use crate::types::{EventKind, Granularity};

/// Gathering 통합 설정
///
/// `gathering.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatheringConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 로그 파서 설정
    #[serde(default)]
    pub parser: LogParserConfig,
    /// 업로드 설정
    #[serde(default)]
    pub upload: UploadConfig,
}

impl GatheringConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, GatheringError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, GatheringError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GatheringError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                GatheringError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, GatheringError> {
        toml::from_str(toml_str).map_err(|e| {
            GatheringError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `GATHERING_{SECTION}_{FIELD}`
    /// 예: `GATHERING_UPLOAD_BASE_URL=https://gathering.example.com`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "GATHERING_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "GATHERING_GENERAL_LOG_FORMAT");

        // Parser
        override_string(
            &mut self.parser.match_start_prefix,
            "GATHERING_PARSER_MATCH_START_PREFIX",
        );
        override_usize(
            &mut self.parser.max_input_bytes,
            "GATHERING_PARSER_MAX_INPUT_BYTES",
        );

        // Upload
        override_string(&mut self.upload.base_url, "GATHERING_UPLOAD_BASE_URL");
        override_string(&mut self.upload.json_path, "GATHERING_UPLOAD_JSON_PATH");
        override_string(&mut self.upload.raw_path, "GATHERING_UPLOAD_RAW_PATH");
        override_string(&mut self.upload.token, "GATHERING_UPLOAD_TOKEN");
        override_string(&mut self.upload.user_agent, "GATHERING_UPLOAD_USER_AGENT");
        override_u64(
            &mut self.upload.timeout_secs,
            "GATHERING_UPLOAD_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.upload.min_interval_secs,
            "GATHERING_UPLOAD_MIN_INTERVAL_SECS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), GatheringError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        self.parser.validate()?;
        self.upload.validate()?;

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 이벤트 종류별 값 테이블
///
/// 종류마다 다른 값(페이로드 오프셋, 분할 단위, 분류 패턴)을 코드 수정 없이
/// 설정으로 바꿀 수 있도록 합니다. TOML에서 하위 테이블을 지정할 경우
/// 여덟 종류를 모두 적어야 합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindTable<T> {
    pub collection: T,
    pub deck_list: T,
    pub inventory: T,
    pub rank_info: T,
    pub auth: T,
    pub match_course: T,
    pub match_start: T,
    pub match_end: T,
}

impl<T> KindTable<T> {
    /// 종류에 해당하는 값
    pub fn get(&self, kind: EventKind) -> &T {
        match kind {
            EventKind::Collection => &self.collection,
            EventKind::DeckList => &self.deck_list,
            EventKind::Inventory => &self.inventory,
            EventKind::RankInfo => &self.rank_info,
            EventKind::Auth => &self.auth,
            EventKind::MatchCourse => &self.match_course,
            EventKind::MatchStart => &self.match_start,
            EventKind::MatchEnd => &self.match_end,
        }
    }

    /// 종류에 해당하는 값 (가변)
    pub fn get_mut(&mut self, kind: EventKind) -> &mut T {
        match kind {
            EventKind::Collection => &mut self.collection,
            EventKind::DeckList => &mut self.deck_list,
            EventKind::Inventory => &mut self.inventory,
            EventKind::RankInfo => &mut self.rank_info,
            EventKind::Auth => &mut self.auth,
            EventKind::MatchCourse => &mut self.match_course,
            EventKind::MatchStart => &mut self.match_start,
            EventKind::MatchEnd => &mut self.match_end,
        }
    }

    /// 모든 값을 변환한 새 테이블을 만듭니다. 첫 번째 실패에서 중단합니다.
    pub fn try_map<U, E>(
        &self,
        mut f: impl FnMut(EventKind, &T) -> Result<U, E>,
    ) -> Result<KindTable<U>, E> {
        Ok(KindTable {
            collection: f(EventKind::Collection, &self.collection)?,
            deck_list: f(EventKind::DeckList, &self.deck_list)?,
            inventory: f(EventKind::Inventory, &self.inventory)?,
            rank_info: f(EventKind::RankInfo, &self.rank_info)?,
            auth: f(EventKind::Auth, &self.auth)?,
            match_course: f(EventKind::MatchCourse, &self.match_course)?,
            match_start: f(EventKind::MatchStart, &self.match_start)?,
            match_end: f(EventKind::MatchEnd, &self.match_end)?,
        })
    }
}

/// 굵은 경계 기본 패턴
pub const DEFAULT_COARSE_BOUNDARY: &str = r"\[UnityCrossThreadLogger\]";
/// 세밀한 경계 기본 패턴
pub const DEFAULT_FINE_BOUNDARY: &str = r"(\[UnityCrossThreadLogger\]|\[Client GRE\])";
/// 매치 시작 라인에서 JSON 앞에 붙는 접두어
pub const DEFAULT_MATCH_START_PREFIX: &str = "(-1) Incoming Event.MatchCreated ";

/// 로그 파서 설정
///
/// 로그 형식 변화에 대응하는 값(경계 패턴, 분류 패턴, 오프셋)을 담습니다.
/// 정규식 컴파일은 파서 크레이트에서 수행합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogParserConfig {
    /// 스냅샷 이벤트용 경계 정규식
    pub coarse_boundary: String,
    /// 인증/매치 라인까지 분리하는 경계 정규식
    pub fine_boundary: String,
    /// 종류별 분류 정규식
    pub patterns: KindTable<String>,
    /// 종류별 페이로드 라인 오프셋 (마커 라인 = 0)
    pub offsets: KindTable<usize>,
    /// 종류별 분할 단위
    pub granularity: KindTable<Granularity>,
    /// 매치 시작 JSON 앞의 접두어
    pub match_start_prefix: String,
    /// 한 번에 처리할 최대 입력 크기 (바이트)
    pub max_input_bytes: usize,
}

impl Default for LogParserConfig {
    fn default() -> Self {
        Self {
            coarse_boundary: DEFAULT_COARSE_BOUNDARY.to_owned(),
            fine_boundary: DEFAULT_FINE_BOUNDARY.to_owned(),
            patterns: KindTable {
                collection: r"<==\sPlayerInventory\.GetPlayerCardsV3\(\d*\)".to_owned(),
                deck_list: r"<==\sDeck\.GetDeckLists\(\d*\)".to_owned(),
                inventory: r"<==\sPlayerInventory\.GetPlayerInventory\(\d*\)".to_owned(),
                rank_info: r"<==\sEvent\.GetCombinedRankInfo\(\d*\)".to_owned(),
                auth: r"ClientToMatchServiceMessageType_AuthenticateRequest".to_owned(),
                match_course: r"<==\sEvent\.GetPlayerCourse\(\d*\)".to_owned(),
                match_start: r"Incoming\sEvent\.MatchCreated".to_owned(),
                match_end: r"DuelScene\.GameStop".to_owned(),
            },
            offsets: KindTable {
                collection: 2,
                deck_list: 2,
                inventory: 2,
                rank_info: 2,
                auth: 1,
                match_course: 2,
                match_start: 1,
                match_end: 2,
            },
            granularity: KindTable {
                collection: Granularity::Coarse,
                deck_list: Granularity::Coarse,
                inventory: Granularity::Coarse,
                rank_info: Granularity::Fine,
                auth: Granularity::Fine,
                match_course: Granularity::Fine,
                match_start: Granularity::Fine,
                match_end: Granularity::Fine,
            },
            match_start_prefix: DEFAULT_MATCH_START_PREFIX.to_owned(),
            max_input_bytes: 256 * 1024 * 1024, // 256MB
        }
    }
}

impl LogParserConfig {
    /// 파서 설정의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("parser.coarse_boundary", &self.coarse_boundary),
            ("parser.fine_boundary", &self.fine_boundary),
        ] {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: "boundary pattern must not be empty".to_owned(),
                });
            }
        }

        for kind in EventKind::ALL {
            if self.patterns.get(kind).is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("parser.patterns.{kind}"),
                    reason: "pattern must not be empty".to_owned(),
                });
            }
            // 0번 라인은 마커 라인 자체
            if *self.offsets.get(kind) == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("parser.offsets.{kind}"),
                    reason: "offset must be at least 1".to_owned(),
                });
            }
        }

        // 매치 조각은 같은 분할 단위에서 순서가 비교되어야 함
        let fragment_granularity = *self.granularity.get(EventKind::MatchStart);
        if EventKind::FRAGMENTS
            .iter()
            .any(|&kind| *self.granularity.get(kind) != fragment_granularity)
        {
            return Err(ConfigError::InvalidValue {
                field: "parser.granularity".to_owned(),
                reason: "match fragments must share one granularity".to_owned(),
            });
        }

        if self.max_input_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "parser.max_input_bytes".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

/// 업로드 설정
///
/// 업로드 전송 계층(`Publisher` 구현체)에 명시적으로 전달됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// 업로드 서버 루트 URL (비어 있으면 업로드하지 않음)
    pub base_url: String,
    /// JSON 페이로드 업로드 경로
    pub json_path: String,
    /// 원본 로그 파일 업로드 경로
    pub raw_path: String,
    /// 인증 토큰
    pub token: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// User-Agent 헤더 값
    pub user_agent: String,
    /// 강제 업로드가 아닐 때 최소 업로드 간격 (초)
    pub min_interval_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            json_path: "/upload/json".to_owned(),
            raw_path: "/upload/raw".to_owned(),
            token: String::new(),
            timeout_secs: 600,
            user_agent: format!("gathering/{}", env!("CARGO_PKG_VERSION")),
            min_interval_secs: 60,
        }
    }
}

impl UploadConfig {
    /// 업로드 대상이 설정되었는지 여부
    pub fn is_enabled(&self) -> bool {
        !self.base_url.is_empty()
    }

    /// 업로드 설정의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "upload.timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.is_enabled()
            && !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                field: "upload.base_url".to_owned(),
                reason: "must start with http:// or https://".to_owned(),
            });
        }

        for (field, value) in [
            ("upload.json_path", &self.json_path),
            ("upload.raw_path", &self.raw_path),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: "path must start with '/'".to_owned(),
                });
            }
        }

        Ok(())
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
