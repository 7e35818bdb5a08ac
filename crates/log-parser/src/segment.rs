//! 로그 분할기 -- 경계 마커 패턴으로 원시 로그 텍스트를 엔트리로 나눕니다
//!
//! 경계 마커 자체는 버려지고, 마커 사이의 텍스트가 순서대로 [`LogEntry`]가 됩니다.
//! 분할은 한 번만 순회 가능한 지연(lazy) 이터레이터로 제공되며, 엔트리는
//! 원본 텍스트를 빌려 쓰므로 파싱 한 번이 끝나면 함께 사라집니다.
//!
//! # 사용 예시
//! ```ignore
//! use gathering_log_parser::segment::Segmenter;
//!
//! let segmenter = Segmenter::new(r"\[UnityCrossThreadLogger\]", Granularity::Coarse)?;
//! for entry in segmenter.segment(raw) {
//!     println!("{}: {}", entry.index(), entry.first_line());
//! }
//! ```

use regex::Regex;

use gathering_core::metrics as m;
use gathering_core::types::Granularity;

use crate::error::LogParserError;

/// 경계 마커 사이의 텍스트 블록
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry<'a> {
    index: usize,
    text: &'a str,
}

impl<'a> LogEntry<'a> {
    /// 주어진 위치와 텍스트로 엔트리를 만듭니다.
    pub fn new(index: usize, text: &'a str) -> Self {
        Self { index, text }
    }

    /// 스트림 내 위치 (0부터)
    pub fn index(&self) -> usize {
        self.index
    }

    /// 엔트리 원문
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// 마커와 같은 줄에 있던 첫 라인
    pub fn first_line(&self) -> &'a str {
        self.text.split('\n').next().unwrap_or_default()
    }

    /// `offset`번째 라인부터 엔트리 끝까지의 텍스트를 반환합니다.
    ///
    /// 마커 라인이 0번입니다. 엔트리의 라인 수가 `offset + 1`보다 적으면 `None`입니다.
    pub fn payload_from(&self, offset: usize) -> Option<&'a str> {
        if offset == 0 {
            return Some(self.text);
        }
        self.text
            .match_indices('\n')
            .nth(offset - 1)
            .map(|(pos, _)| &self.text[pos + 1..])
    }
}

/// 경계 마커 패턴 기반 분할기
#[derive(Debug, Clone)]
pub struct Segmenter {
    boundary: Regex,
    granularity: Granularity,
}

impl Segmenter {
    /// 경계 정규식으로 새 분할기를 생성합니다.
    pub fn new(pattern: &str, granularity: Granularity) -> Result<Self, LogParserError> {
        if pattern.is_empty() {
            return Err(LogParserError::Config {
                field: format!("{granularity}_boundary"),
                reason: "boundary pattern must not be empty".to_owned(),
            });
        }
        Ok(Self {
            boundary: Regex::new(pattern)?,
            granularity,
        })
    }

    /// 분할 단위
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// 경계 패턴 원문
    pub fn pattern(&self) -> &str {
        self.boundary.as_str()
    }

    /// 원시 텍스트를 엔트리 시퀀스로 분할합니다.
    ///
    /// 빈 입력은 엔트리를 만들지 않습니다. 첫 마커 이전의 텍스트도
    /// 0번 엔트리로 포함됩니다.
    pub fn segment<'a>(&'a self, raw: &'a str) -> Segments<'a> {
        Segments {
            inner: (!raw.is_empty()).then(|| self.boundary.split(raw)),
            index: 0,
            granularity: self.granularity,
        }
    }
}

/// [`Segmenter::segment`]가 반환하는 단일 패스 이터레이터
pub struct Segments<'a> {
    inner: Option<regex::Split<'a, 'a>>,
    index: usize,
    granularity: Granularity,
}

impl<'a> Iterator for Segments<'a> {
    type Item = LogEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let text = self.inner.as_mut()?.next()?;
        let entry = LogEntry::new(self.index, text);
        self.index += 1;
        metrics::counter!(
            m::LOG_PARSER_ENTRIES_TOTAL,
            m::LABEL_GRANULARITY => self.granularity.as_str()
        )
        .increment(1);
        Some(entry)
    }
}
