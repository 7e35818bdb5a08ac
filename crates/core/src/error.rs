//! 에러 타입 — 도메인별 에러 정의

/// Gathering 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum GatheringError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 로그 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 업로드 전송 에러
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파싱 에러
///
/// 로그 스냅샷 하나에 대한 결과 분류입니다. 어느 것도 전체 파싱을 중단시키지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 이 로그 스냅샷에 해당 종류의 엔트리가 없음 (흔한 상황)
    #[error("{kind} not found")]
    NotFound { kind: String },

    /// 매칭된 엔트리의 JSON 디코딩 실패
    #[error("failed to decode {kind}: {reason}")]
    DecodeFailure { kind: String, reason: String },

    /// 조각(fragment)의 필수 구조가 없음
    #[error("malformed {kind} fragment: {reason}")]
    MalformedFragment { kind: String, reason: String },
}

/// 업로드 전송 에러
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// 요청 생성 실패
    #[error("failed to build request: {0}")]
    Request(String),

    /// 전송 실패 (연결, 타임아웃 등)
    #[error("transport failed: {0}")]
    Transport(String),

    /// 서버가 성공이 아닌 상태 코드를 반환
    #[error("server responded with status {status}")]
    Status { status: u16 },
}
