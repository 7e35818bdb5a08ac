//! 업로드 페이로드 조립
//!
//! [`UploadAssembler`]는 로그 텍스트 하나를 파싱해 엔티티별 최신 값을 담은
//! [`UploadPayload`]로 묶고, 필요하면 [`Publisher`]로 전송합니다.
//! 일부 엔티티를 찾지 못했거나 디코딩에 실패해도 나머지만으로 전송합니다.

use std::time::Instant;

use tracing::{debug, info, warn};

use gathering_core::config::LogParserConfig;
use gathering_core::error::GatheringError;
use gathering_core::metrics as m;
use gathering_core::pipeline::Publisher;
use gathering_core::types::UploadPayload;
use gathering_log_parser::{GameLogParser, ParserConfig};

use crate::throttle::UploadThrottle;

/// 업로드 페이로드 조립기
#[derive(Debug, Clone)]
pub struct UploadAssembler {
    parser: GameLogParser,
}

impl UploadAssembler {
    /// 준비된 파서로 조립기를 생성합니다.
    pub fn new(parser: GameLogParser) -> Self {
        Self { parser }
    }

    /// `[parser]` 설정 섹션으로 조립기를 생성합니다.
    pub fn from_config(config: &LogParserConfig) -> Result<Self, GatheringError> {
        let parser = GameLogParser::new(ParserConfig::from_core(config))?;
        Ok(Self::new(parser))
    }

    /// 내부 파서
    pub fn parser(&self) -> &GameLogParser {
        &self.parser
    }

    /// 로그 텍스트로 업로드 페이로드를 조립합니다.
    pub fn assemble(&self, raw: &str) -> UploadPayload {
        let payload = self.parser.parse_all(raw);
        info!(
            fields = ?payload.present_fields(),
            matches = payload.matches.as_ref().map_or(0, Vec::len),
            "upload payload assembled"
        );
        payload
    }

    /// 페이로드를 조립해 전송합니다.
    ///
    /// 엔티티 일부가 비어 있어도 전송하며, 전송 실패만 에러로 반환합니다.
    pub async fn assemble_and_publish<P: Publisher>(
        &self,
        raw: &str,
        publisher: &P,
    ) -> Result<UploadPayload, GatheringError> {
        let payload = self.assemble(raw);

        match publisher.publish(&payload).await {
            Ok(()) => {
                metrics::counter!(m::UPLOADER_UPLOADS_TOTAL, m::LABEL_RESULT => "success")
                    .increment(1);
                info!(publisher = publisher.name(), "upload succeeded");
                Ok(payload)
            }
            Err(e) => {
                metrics::counter!(m::UPLOADER_UPLOADS_TOTAL, m::LABEL_RESULT => "failure")
                    .increment(1);
                warn!(publisher = publisher.name(), error = %e, "upload failed");
                Err(e)
            }
        }
    }

    /// 로그 변경 알림을 처리합니다.
    ///
    /// 간격 제한에 걸리면 파싱하지 않고 `Ok(None)`을 반환합니다.
    /// 전송에 성공한 경우에만 업로드 시각을 기록합니다.
    pub async fn on_change<P: Publisher>(
        &self,
        raw: &str,
        publisher: &P,
        throttle: &mut UploadThrottle,
        now: Instant,
        force: bool,
    ) -> Result<Option<UploadPayload>, GatheringError> {
        if !throttle.is_due(now, force) {
            debug!(
                remaining_secs = throttle.remaining(now).as_secs(),
                "log changed but uploaded too recently, skipping"
            );
            metrics::counter!(m::UPLOADER_UPLOADS_SKIPPED_TOTAL).increment(1);
            return Ok(None);
        }

        let payload = self.assemble_and_publish(raw, publisher).await?;
        throttle.record(now);
        Ok(Some(payload))
    }
}
