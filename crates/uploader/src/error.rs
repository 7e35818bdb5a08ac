//! 업로더 에러 타입
//!
//! [`UploadError`]는 `From<UploadError> for GatheringError` 변환을 제공하여
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use gathering_core::error::{ConfigError, GatheringError, PublishError};

/// 업로더 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// 업로드 대상 URL이 설정되지 않음
    #[error("upload disabled: base_url is not configured")]
    Disabled,

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 페이로드 직렬화 실패
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// 요청 생성 실패
    #[error("failed to build request: {0}")]
    Request(String),

    /// 전송 실패 (연결, 타임아웃 등)
    #[error("transport failed: {0}")]
    Transport(String),

    /// 성공이 아닌 HTTP 상태 코드
    #[error("server responded with status {status}")]
    Status {
        /// HTTP 상태 코드
        status: u16,
    },

    /// 원본 로그 파일 읽기 실패
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// reqwest 에러를 요청 생성/전송 실패로 분류합니다.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Request(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<UploadError> for GatheringError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Disabled => ConfigError::InvalidValue {
                field: "upload.base_url".to_owned(),
                reason: "must be set to upload".to_owned(),
            }
            .into(),
            UploadError::Config { field, reason } => {
                ConfigError::InvalidValue { field, reason }.into()
            }
            UploadError::Serialize(e) => PublishError::Request(e.to_string()).into(),
            UploadError::Request(reason) => PublishError::Request(reason).into(),
            UploadError::Transport(reason) => PublishError::Transport(reason).into(),
            UploadError::Status { status } => PublishError::Status { status }.into(),
            UploadError::Io(e) => GatheringError::Io(e),
        }
    }
}
