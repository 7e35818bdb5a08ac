//! 로그 파서 설정
//!
//! [`ParserConfig`]는 core의 [`LogParserConfig`](gathering_core::config::LogParserConfig)를
//! 기반으로 파서 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use gathering_core::config::GatheringConfig;
//! use gathering_log_parser::config::ParserConfig;
//!
//! let core_config = GatheringConfig::default();
//! let config = ParserConfig::from_core(&core_config.parser);
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};

use gathering_core::config::{
    DEFAULT_COARSE_BOUNDARY, DEFAULT_FINE_BOUNDARY, KindTable, LogParserConfig,
};
use gathering_core::error::ConfigError;
use gathering_core::types::{EventKind, Granularity};

use crate::error::LogParserError;

/// 로그 파서 설정
///
/// core의 `LogParserConfig`에서 파생되며, 파서 내부에서
/// 사용하는 추가 설정을 포함합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// 스냅샷 이벤트용 경계 정규식
    pub coarse_boundary: String,
    /// 인증/매치 라인까지 분리하는 경계 정규식
    pub fine_boundary: String,
    /// 종류별 분류 정규식
    pub patterns: KindTable<String>,
    /// 종류별 페이로드 라인 오프셋
    pub offsets: KindTable<usize>,
    /// 종류별 분할 단위
    pub granularity: KindTable<Granularity>,
    /// 매치 시작 JSON 앞의 접두어
    pub match_start_prefix: String,
    /// 최대 입력 크기 (바이트)
    pub max_input_bytes: usize,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 디코딩 실패 로그에 포함할 페이로드 앞부분 길이 (문자 수, 0이면 생략)
    pub decode_snippet_chars: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::from_core(&LogParserConfig::default())
    }
}

impl ParserConfig {
    /// core의 `LogParserConfig`에서 파서 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &LogParserConfig) -> Self {
        Self {
            coarse_boundary: core.coarse_boundary.clone(),
            fine_boundary: core.fine_boundary.clone(),
            patterns: core.patterns.clone(),
            offsets: core.offsets.clone(),
            granularity: core.granularity.clone(),
            match_start_prefix: core.match_start_prefix.clone(),
            max_input_bytes: core.max_input_bytes,
            decode_snippet_chars: 120,
        }
    }

    /// 종류에 해당하는 경계 패턴
    pub fn boundary_for(&self, kind: EventKind) -> &str {
        match self.granularity.get(kind) {
            Granularity::Coarse => &self.coarse_boundary,
            Granularity::Fine => &self.fine_boundary,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// core 규칙 검사 후 모든 정규식을 한 번 컴파일해 봅니다.
    pub fn validate(&self) -> Result<(), LogParserError> {
        self.to_core().validate().map_err(config_error)?;

        for (field, pattern) in [
            ("coarse_boundary", &self.coarse_boundary),
            ("fine_boundary", &self.fine_boundary),
        ] {
            Regex::new(pattern).map_err(|e| LogParserError::Config {
                field: field.to_owned(),
                reason: e.to_string(),
            })?;
        }

        self.patterns.try_map(|kind, pattern| {
            Regex::new(pattern)
                .map(drop)
                .map_err(|e| LogParserError::Config {
                    field: format!("parser.patterns.{kind}"),
                    reason: e.to_string(),
                })
        })?;

        Ok(())
    }

    fn to_core(&self) -> LogParserConfig {
        LogParserConfig {
            coarse_boundary: self.coarse_boundary.clone(),
            fine_boundary: self.fine_boundary.clone(),
            patterns: self.patterns.clone(),
            offsets: self.offsets.clone(),
            granularity: self.granularity.clone(),
            match_start_prefix: self.match_start_prefix.clone(),
            max_input_bytes: self.max_input_bytes,
        }
    }
}

fn config_error(err: ConfigError) -> LogParserError {
    match err {
        ConfigError::InvalidValue { field, reason } => LogParserError::Config { field, reason },
        other => LogParserError::Config {
            field: "parser".to_owned(),
            reason: other.to_string(),
        },
    }
}

/// 파서 설정 빌더
#[derive(Default)]
pub struct ParserConfigBuilder {
    config: ParserConfig,
}

impl ParserConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 굵은 경계 패턴을 설정합니다.
    pub fn coarse_boundary(mut self, pattern: impl Into<String>) -> Self {
        self.config.coarse_boundary = pattern.into();
        self
    }

    /// 세밀한 경계 패턴을 설정합니다.
    pub fn fine_boundary(mut self, pattern: impl Into<String>) -> Self {
        self.config.fine_boundary = pattern.into();
        self
    }

    /// 한 종류의 분류 패턴을 설정합니다.
    pub fn pattern(mut self, kind: EventKind, pattern: impl Into<String>) -> Self {
        *self.config.patterns.get_mut(kind) = pattern.into();
        self
    }

    /// 한 종류의 페이로드 오프셋을 설정합니다.
    pub fn offset(mut self, kind: EventKind, offset: usize) -> Self {
        *self.config.offsets.get_mut(kind) = offset;
        self
    }

    /// 한 종류의 분할 단위를 설정합니다.
    pub fn granularity(mut self, kind: EventKind, granularity: Granularity) -> Self {
        *self.config.granularity.get_mut(kind) = granularity;
        self
    }

    /// 매치 시작 접두어를 설정합니다.
    pub fn match_start_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.match_start_prefix = prefix.into();
        self
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn max_input_bytes(mut self, max: usize) -> Self {
        self.config.max_input_bytes = max;
        self
    }

    /// 디코딩 실패 로그의 스니펫 길이를 설정합니다.
    pub fn decode_snippet_chars(mut self, chars: usize) -> Self {
        self.config.decode_snippet_chars = chars;
        self
    }

    /// 설정을 검증하고 `ParserConfig`를 생성합니다.
    pub fn build(self) -> Result<ParserConfig, LogParserError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
