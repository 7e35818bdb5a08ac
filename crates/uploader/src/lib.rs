#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`assembler`]: 로그 텍스트 → 업로드 페이로드 조립 및 전송
//! - [`http`]: HTTP `Publisher` 구현 (JSON, 원본 multipart)
//! - [`throttle`]: 업로드 최소 간격 제한
//! - [`error`]: 도메인 에러 타입
//!
//! # 흐름
//!
//! ```text
//! file change -> UploadThrottle -> UploadAssembler::assemble -> Publisher::publish
//!                 (skip if recent)   (GameLogParser::parse_all)   (HttpPublisher)
//! ```

pub mod assembler;
pub mod error;
pub mod http;
pub mod throttle;

// --- 주요 타입 re-export ---

pub use assembler::UploadAssembler;
pub use error::UploadError;
pub use http::HttpPublisher;
pub use throttle::UploadThrottle;
