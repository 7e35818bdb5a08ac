//! 관대한(tolerant) JSON 추출기
//!
//! 로그의 JSON 블롭 뒤에는 다음 라인들로 관계없는 텍스트가 붙어 있을 수 있습니다.
//! [`extract_json`]은 전체 텍스트 디코딩을 시도하고, 실패하면 마지막 라인을
//! 잘라내고 다시 시도하는 백오프(backoff) 방식으로 JSON을 찾습니다.
//!
//! 앞부분 부분 문자열이나 스트리밍 파싱은 시도하지 않습니다. 후보는 항상
//! "전체 텍스트에서 뒤쪽 라인 몇 개를 뺀 것"입니다. 시도 횟수는 라인 수로 제한됩니다.

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::LogParserError;

/// 뒤쪽 라인을 하나씩 잘라내며 `text`에서 JSON 값을 디코딩합니다.
///
/// # 에러
/// - 빈 입력: [`LogParserError::EmptyPayload`] (디코딩 시도 없음)
/// - 모든 후보 실패: [`LogParserError::NoJsonFound`]
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, LogParserError> {
    if text.is_empty() {
        debug!("json backoff got an empty string");
        return Err(LogParserError::EmptyPayload);
    }

    let mut end = text.len();
    let mut attempts = 0usize;

    loop {
        let candidate = &text[..end];
        attempts += 1;

        match serde_json::from_str::<T>(candidate) {
            Ok(value) => {
                if attempts > 1 {
                    trace!(trimmed_lines = attempts - 1, "json recovered after trimming");
                }
                return Ok(value);
            }
            Err(e) => {
                trace!(attempt = attempts, error = %e, "json candidate rejected");
            }
        }

        match candidate.rfind('\n') {
            Some(pos) => end = pos,
            None => {
                debug!(attempts, "json backoff ran out of lines");
                return Err(LogParserError::NoJsonFound { attempts });
            }
        }
    }
}

/// [`extract_json`]의 구조화되지 않은 버전
pub fn extract_value(text: &str) -> Result<serde_json::Value, LogParserError> {
    extract_json(text)
}
