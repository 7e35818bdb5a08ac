//! 파이프라인 trait — 모듈 확장 포인트 정의

use std::future::Future;

use crate::error::GatheringError;
use crate::types::UploadPayload;

/// 업로드 전송 trait
///
/// 조립된 페이로드를 외부로 보냅니다. 재시도/타임아웃 정책은 구현체가 결정하며,
/// 파서 코어는 이 trait을 통해서만 전송 계층을 호출합니다.
pub trait Publisher: Send + Sync {
    /// 전송 대상 이름 (로그용)
    fn name(&self) -> &str;

    /// 페이로드를 전송합니다.
    fn publish(
        &self,
        payload: &UploadPayload,
    ) -> impl Future<Output = Result<(), GatheringError>> + Send;
}
