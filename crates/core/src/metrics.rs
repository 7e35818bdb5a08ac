//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `gathering_`
//! - 모듈명: `log_parser_`, `uploader_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(gathering_core::metrics::LOG_PARSER_ENTRIES_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 이벤트 종류 레이블 키 (collection, deck_list, ...)
pub const LABEL_KIND: &str = "kind";

/// 분할 단위 레이블 키 (coarse, fine)
pub const LABEL_GRANULARITY: &str = "granularity";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Log Parser 메트릭 ──────────────────────────────────────────────

/// Log Parser: 분할된 로그 엔트리 수 (counter, label: granularity)
pub const LOG_PARSER_ENTRIES_TOTAL: &str = "gathering_log_parser_entries_total";

/// Log Parser: 찾은 스냅샷 수 (counter, label: kind)
pub const LOG_PARSER_SNAPSHOTS_FOUND_TOTAL: &str = "gathering_log_parser_snapshots_found_total";

/// Log Parser: JSON 디코딩 실패 수 (counter, label: kind)
pub const LOG_PARSER_DECODE_FAILURES_TOTAL: &str = "gathering_log_parser_decode_failures_total";

/// Log Parser: 완성된 매치 수 (counter)
pub const LOG_PARSER_MATCHES_COMPLETED_TOTAL: &str =
    "gathering_log_parser_matches_completed_total";

/// Log Parser: 새 시작/코스 조각에 의해 버려진 미완성 매치 수 (counter)
pub const LOG_PARSER_CANDIDATES_DISCARDED_TOTAL: &str =
    "gathering_log_parser_candidates_discarded_total";

/// Log Parser: 진행 중인 매치 없이 도착한 종료 조각 수 (counter)
pub const LOG_PARSER_ORPHAN_END_FRAGMENTS_TOTAL: &str =
    "gathering_log_parser_orphan_end_fragments_total";

/// Log Parser: 크기 제한으로 거부된 입력 수 (counter)
pub const LOG_PARSER_INPUTS_REJECTED_TOTAL: &str = "gathering_log_parser_inputs_rejected_total";

// ─── Uploader 메트릭 ────────────────────────────────────────────────

/// Uploader: 업로드 시도 수 (counter, label: result)
pub const UPLOADER_UPLOADS_TOTAL: &str = "gathering_uploader_uploads_total";

/// Uploader: 간격 제한으로 건너뛴 업로드 수 (counter)
pub const UPLOADER_UPLOADS_SKIPPED_TOTAL: &str = "gathering_uploader_uploads_skipped_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::describe_counter;

    // Log Parser
    describe_counter!(
        LOG_PARSER_ENTRIES_TOTAL,
        "Total number of log entries produced by the segmenter"
    );
    describe_counter!(
        LOG_PARSER_SNAPSHOTS_FOUND_TOTAL,
        "Total number of snapshot entities successfully extracted"
    );
    describe_counter!(
        LOG_PARSER_DECODE_FAILURES_TOTAL,
        "Total number of matched entries whose JSON payload failed to decode"
    );
    describe_counter!(
        LOG_PARSER_MATCHES_COMPLETED_TOTAL,
        "Total number of matches completed by an end fragment"
    );
    describe_counter!(
        LOG_PARSER_CANDIDATES_DISCARDED_TOTAL,
        "Total number of unfinished match candidates replaced by a newer fragment"
    );
    describe_counter!(
        LOG_PARSER_ORPHAN_END_FRAGMENTS_TOTAL,
        "Total number of end fragments seen without an in-progress match"
    );
    describe_counter!(
        LOG_PARSER_INPUTS_REJECTED_TOTAL,
        "Total number of log texts rejected for exceeding the input size limit"
    );

    // Uploader
    describe_counter!(
        UPLOADER_UPLOADS_TOTAL,
        "Total number of upload attempts by result"
    );
    describe_counter!(
        UPLOADER_UPLOADS_SKIPPED_TOTAL,
        "Total number of uploads skipped by the minimum upload interval"
    );
}
