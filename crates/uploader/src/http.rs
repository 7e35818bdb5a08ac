//! HTTP 업로드 전송
//!
//! [`HttpPublisher`]는 [`Publisher`] trait의 HTTP 구현입니다.
//!
//! - JSON 업로드: `POST {base_url}{json_path}`, 본문은 직렬화된 [`UploadPayload`]
//! - 원본 업로드: `POST {base_url}{raw_path}`, multipart 폼 파일 하나
//!
//! 두 요청 모두 `Authorization: token <token>`과 `User-Agent` 헤더를 붙입니다.
//! 응답 본문은 읽어서 버립니다.

use std::path::Path;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Request};
use tracing::{debug, info};

use gathering_core::config::UploadConfig;
use gathering_core::error::GatheringError;
use gathering_core::pipeline::Publisher;
use gathering_core::types::UploadPayload;

use crate::error::UploadError;

/// 원본 로그 업로드 폼 필드 이름
pub const RAW_FORM_FIELD: &str = "file";

/// HTTP 업로드 전송기
///
/// 설정은 생성 시 한 번 받아 보관하며, 전역 상태를 사용하지 않습니다.
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: Client,
    config: UploadConfig,
}

impl HttpPublisher {
    /// 업로드 설정으로 전송기를 생성합니다.
    ///
    /// # 에러
    /// - `base_url` 미설정: [`UploadError::Disabled`]
    /// - 설정 검증 실패: [`UploadError::Config`]
    pub fn new(config: UploadConfig) -> Result<Self, UploadError> {
        config.validate().map_err(|e| UploadError::Config {
            field: "upload".to_owned(),
            reason: e.to_string(),
        })?;
        if !config.is_enabled() {
            return Err(UploadError::Disabled);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(UploadError::from_reqwest)?;

        Ok(Self { client, config })
    }

    /// 업로드 설정
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// JSON 업로드 URL
    pub fn json_url(&self) -> String {
        self.url(&self.config.json_path)
    }

    /// 원본 로그 업로드 URL
    pub fn raw_url(&self) -> String {
        self.url(&self.config.raw_path)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorization(&self) -> String {
        format!("token {}", self.config.token)
    }

    /// 페이로드 업로드 요청을 만듭니다 (전송하지 않음).
    pub fn build_json_request(&self, payload: &UploadPayload) -> Result<Request, UploadError> {
        let body = serde_json::to_vec(payload)?;
        self.client
            .post(self.json_url())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, self.config.user_agent.as_str())
            .header(AUTHORIZATION, self.authorization())
            .body(body)
            .build()
            .map_err(UploadError::from_reqwest)
    }

    /// 원본 로그 업로드 요청을 만듭니다 (전송하지 않음).
    ///
    /// `name`은 폼 필드 이름과 파일 이름으로 함께 쓰입니다.
    pub fn build_raw_request(&self, name: &str, contents: Vec<u8>) -> Result<Request, UploadError> {
        let part = Part::bytes(contents).file_name(name.to_owned());
        let form = Form::new().part(name.to_owned(), part);
        self.client
            .post(self.raw_url())
            .header(USER_AGENT, self.config.user_agent.as_str())
            .header(AUTHORIZATION, self.authorization())
            .multipart(form)
            .build()
            .map_err(UploadError::from_reqwest)
    }

    /// 페이로드를 JSON으로 업로드합니다.
    pub async fn upload_json(&self, payload: &UploadPayload) -> Result<(), UploadError> {
        let request = self.build_json_request(payload)?;
        debug!(
            url = %request.url(),
            fields = ?payload.present_fields(),
            "uploading payload"
        );
        self.send(request).await
    }

    /// 원본 로그 내용을 multipart 파일로 업로드합니다.
    pub async fn upload_raw(&self, name: &str, contents: Vec<u8>) -> Result<(), UploadError> {
        let size = contents.len();
        let request = self.build_raw_request(name, contents)?;
        debug!(url = %request.url(), name, size, "uploading raw log");
        self.send(request).await?;
        info!(name, size, "raw log upload succeeded");
        Ok(())
    }

    /// 로그 파일을 읽어 원본 업로드합니다.
    pub async fn upload_file(&self, path: impl AsRef<Path>) -> Result<(), UploadError> {
        let contents = tokio::fs::read(path.as_ref()).await?;
        self.upload_raw(RAW_FORM_FIELD, contents).await
    }

    async fn send(&self, request: Request) -> Result<(), UploadError> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(UploadError::from_reqwest)?;
        let status = response.status();
        // 연결 재사용을 위해 본문을 비움
        let _ = response.bytes().await;

        if !status.is_success() {
            return Err(UploadError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

impl Publisher for HttpPublisher {
    fn name(&self) -> &str {
        "http"
    }

    async fn publish(&self, payload: &UploadPayload) -> Result<(), GatheringError> {
        self.upload_json(payload).await.map_err(Into::into)
    }
}
