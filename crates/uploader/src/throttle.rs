//! 업로드 간격 제한
//!
//! 로그 파일 변경 알림은 짧은 간격으로 몰려 올 수 있습니다.
//! [`UploadThrottle`]은 마지막 업로드 이후 최소 간격이 지나지 않았으면
//! 강제 요청이 아닌 한 업로드를 건너뛰도록 판단합니다.
//!
//! 시각은 호출자가 넘겨주므로 테스트에서 시간을 조작할 수 있습니다.
//! 파싱 패스 사이에 유지되는 유일한 상태이며, 매치 누적 상태와는 무관합니다.

use std::time::{Duration, Instant};

use gathering_core::config::UploadConfig;

/// 업로드 간격 제한기
#[derive(Debug, Clone)]
pub struct UploadThrottle {
    min_interval: Duration,
    last_upload: Option<Instant>,
}

impl UploadThrottle {
    /// 최소 간격으로 생성합니다. 아직 업로드한 적이 없으므로 첫 요청은 통과합니다.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_upload: None,
        }
    }

    /// 업로드 설정의 `min_interval_secs`로 생성합니다.
    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(Duration::from_secs(config.min_interval_secs))
    }

    /// 최소 간격
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// 마지막 업로드 시각
    pub fn last_upload(&self) -> Option<Instant> {
        self.last_upload
    }

    /// `now` 시점에 업로드해도 되는지 여부 (상태 변경 없음)
    pub fn is_due(&self, now: Instant, force: bool) -> bool {
        force || self.remaining(now).is_zero()
    }

    /// 다음 업로드까지 남은 시간
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_upload {
            Some(last) => self
                .min_interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// 업로드 시각을 기록합니다.
    pub fn record(&mut self, now: Instant) {
        self.last_upload = Some(now);
    }

    /// 업로드 가능하면 시각을 기록하고 `true`를 반환합니다.
    pub fn try_acquire(&mut self, now: Instant, force: bool) -> bool {
        if !self.is_due(now, force) {
            return false;
        }
        self.record(now);
        true
    }
}
