#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`segment`]: 경계 마커 패턴으로 원시 텍스트를 엔트리로 분할
//! - [`classify`]: 이벤트 종류별 정규식 분류기
//! - [`extract`]: 뒤쪽 라인을 잘라내며 JSON을 찾는 관대한 추출기
//! - [`parser`]: 종류별 스냅샷 파서와 전체 패스 조립 ([`GameLogParser`])
//! - [`matches`]: 코스/시작/종료 조각을 연결하는 매치 누적기
//! - [`config`]: 파서 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! raw text -> Segmenter(coarse) -> Classifier -> last entry -> payload line -> serde_json
//!          |                                                   (collection, decks, inventory)
//!          -> Segmenter(fine)   -> Classifier -> last entry -> payload line -> serde_json
//!          |                                                   (rank, auth)
//!          -> Segmenter(fine)   -> MatchAccumulator (course -> start -> end) -> Vec<Match>
//!                                                   |
//!                                            UploadPayload
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod matches;
pub mod parser;
pub mod segment;

// --- 주요 타입 re-export ---

// 파서
pub use parser::GameLogParser;

// 매치 누적기
pub use matches::{AccumulatorState, MatchAccumulator};

// 구성 요소
pub use classify::Classifier;
pub use extract::{extract_json, extract_value};
pub use segment::{LogEntry, Segmenter, Segments};

// 설정
pub use config::{ParserConfig, ParserConfigBuilder};

// 에러
pub use error::LogParserError;
