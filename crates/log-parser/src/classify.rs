//! 이벤트 분류기 -- 엔트리 텍스트에 대한 종류별 패턴 검사
//!
//! [`Classifier`]는 이벤트 종류마다 정규식 하나를 미리 컴파일해 둡니다.
//! 각 검사는 부수 효과가 없는 술어(predicate)이므로 평가 순서는 결과에 영향을 주지 않습니다.

use regex::Regex;

use gathering_core::config::KindTable;
use gathering_core::types::EventKind;
use tracing::warn;

use crate::error::LogParserError;
use crate::segment::LogEntry;

/// 종류별 정규식 분류기
#[derive(Debug, Clone)]
pub struct Classifier {
    patterns: KindTable<Regex>,
}

impl Classifier {
    /// 종류별 패턴 테이블을 컴파일합니다.
    pub fn new(patterns: &KindTable<String>) -> Result<Self, LogParserError> {
        let patterns = patterns.try_map(|kind, pattern| {
            Regex::new(pattern).map_err(|e| LogParserError::Config {
                field: format!("parser.patterns.{kind}"),
                reason: e.to_string(),
            })
        })?;
        Ok(Self { patterns })
    }

    /// 엔트리가 해당 종류인지 검사합니다.
    pub fn matches(&self, kind: EventKind, entry: &LogEntry<'_>) -> bool {
        self.patterns.get(kind).is_match(entry.text())
    }

    /// 엔트리에 매칭되는 모든 종류
    pub fn kinds(&self, entry: &LogEntry<'_>) -> impl Iterator<Item = EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(move |&kind| self.matches(kind, entry))
    }

    /// 매치 조각 종류를 판별합니다.
    ///
    /// 코스/시작/종료 마커는 서로 겹치지 않아야 합니다. 둘 이상이 매칭되면
    /// 경고를 남기고 코스 > 시작 > 종료 순서로 하나를 고릅니다.
    pub fn fragment_kind(&self, entry: &LogEntry<'_>) -> Option<EventKind> {
        let mut hits = EventKind::FRAGMENTS
            .into_iter()
            .filter(|&kind| self.matches(kind, entry));
        let first = hits.next()?;
        if let Some(second) = hits.next() {
            warn!(
                entry = entry.index(),
                first = %first,
                second = %second,
                "entry matches more than one fragment marker"
            );
        }
        Some(first)
    }
}
