//! 로그 파서 에러 타입
//!
//! [`LogParserError`]는 로그 파서 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogParserError> for GatheringError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use gathering_core::error::{ConfigError, GatheringError, ParseError};
use gathering_core::types::EventKind;

/// 로그 파서 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogParserError {
    /// 해당 종류의 엔트리가 로그에 없음
    #[error("{kind} not found")]
    NotFound {
        /// 찾던 이벤트 종류
        kind: EventKind,
    },

    /// 매칭된 엔트리의 JSON 디코딩 실패
    #[error("failed to decode {kind}: {reason}")]
    Decode {
        /// 이벤트 종류
        kind: EventKind,
        /// 실패 사유
        reason: String,
    },

    /// 조각의 필수 구조가 없음
    #[error("malformed {kind} fragment: {reason}")]
    MalformedFragment {
        /// 조각 종류
        kind: EventKind,
        /// 사유
        reason: String,
    },

    /// JSON 추출 대상이 빈 문자열
    #[error("json extraction got an empty payload")]
    EmptyPayload,

    /// 모든 라인을 잘라낼 때까지 유효한 JSON을 찾지 못함
    #[error("no valid json found after {attempts} attempts")]
    NoJsonFound {
        /// 디코딩 시도 횟수
        attempts: usize,
    },

    /// 입력 크기 초과
    #[error("input too large: {size} bytes (max: {max})")]
    InputTooLarge {
        /// 입력 크기
        size: usize,
        /// 최대 허용 크기
        max: usize,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl LogParserError {
    /// 로그에 엔트리가 없어서 생긴 에러인지 여부 (정상적인 상황)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<LogParserError> for GatheringError {
    fn from(err: LogParserError) -> Self {
        match err {
            LogParserError::NotFound { kind } => ParseError::NotFound {
                kind: kind.to_string(),
            }
            .into(),
            LogParserError::Decode { kind, reason } => ParseError::DecodeFailure {
                kind: kind.to_string(),
                reason,
            }
            .into(),
            LogParserError::MalformedFragment { kind, reason } => ParseError::MalformedFragment {
                kind: kind.to_string(),
                reason,
            }
            .into(),
            LogParserError::Config { field, reason } => {
                ConfigError::InvalidValue { field, reason }.into()
            }
            LogParserError::Regex(e) => ConfigError::InvalidValue {
                field: "parser".to_owned(),
                reason: e.to_string(),
            }
            .into(),
            other @ (LogParserError::EmptyPayload
            | LogParserError::NoJsonFound { .. }
            | LogParserError::InputTooLarge { .. }) => ParseError::DecodeFailure {
                kind: "input".to_owned(),
                reason: other.to_string(),
            }
            .into(),
        }
    }
}
