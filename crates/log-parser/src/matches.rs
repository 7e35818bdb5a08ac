//! 매치 누적기 -- 코스/시작/종료 조각을 등장 순서로 연결하는 상태 기계
//!
//! 조각 사이에는 신뢰할 만한 상관 ID가 없으므로 순서만으로 연결합니다.
//! 진행 중인 매치 후보는 항상 최대 하나입니다.
//!
//! # 상태 전이
//! ```text
//!            course / start                 end (후보 있음)
//!   Idle ─────────────────────> Building ─────────────────────> Idle (+ 완성 매치)
//!                                  │  course: 후보를 버리고 새로 시작
//!                                  │  start:  후보 교체 (코스 덱만 있던 후보는 덱 유지)
//!   Idle ── end ──> Idle (무시: 진행 중인 매치 없음)
//! ```
//!
//! 종료 조각을 만나지 못한 후보는 출력에 포함되지 않습니다. 에러가 아닙니다.

use serde::Deserialize;
use tracing::{debug, info, warn};

use gathering_core::metrics as m;
use gathering_core::types::{Deck, EventKind, Match, MatchResult};

use crate::error::LogParserError;
use crate::extract::extract_json;
use crate::parser::{GameLogParser, snippet};
use crate::segment::LogEntry;

/// 누적기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    /// 진행 중인 매치 없음
    Idle,
    /// 코스 또는 시작 조각을 받고 종료 조각을 기다리는 중
    Building,
}

/// 코스 조각 본문
#[derive(Debug, Deserialize)]
struct CourseFragment {
    #[serde(rename = "CourseDeck", default)]
    course_deck: Option<Deck>,
}

/// 종료 조각 본문: `{"params": {"payloadObject": {...}}}`
#[derive(Debug, Deserialize)]
struct MatchEndEnvelope {
    #[serde(default)]
    params: Option<MatchEndParams>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchEndParams {
    #[serde(default)]
    payload_object: Option<MatchResult>,
}

impl MatchEndEnvelope {
    fn into_result(self) -> Result<MatchResult, LogParserError> {
        let params = self.params.ok_or_else(|| LogParserError::MalformedFragment {
            kind: EventKind::MatchEnd,
            reason: "missing params".to_owned(),
        })?;
        params
            .payload_object
            .ok_or_else(|| LogParserError::MalformedFragment {
                kind: EventKind::MatchEnd,
                reason: "missing params.payloadObject".to_owned(),
            })
    }
}

/// 매치 누적기
///
/// 한 번의 파싱 패스 동안만 존재합니다. 엔트리는 반드시 로그 순서대로
/// [`feed`](Self::feed)해야 합니다.
pub struct MatchAccumulator<'p> {
    parser: &'p GameLogParser,
    candidate: Option<Match>,
    completed: Vec<Match>,
}

impl<'p> MatchAccumulator<'p> {
    /// 빈 누적기를 생성합니다.
    pub fn new(parser: &'p GameLogParser) -> Self {
        Self {
            parser,
            candidate: None,
            completed: Vec::new(),
        }
    }

    /// 현재 상태
    pub fn state(&self) -> AccumulatorState {
        if self.candidate.is_some() {
            AccumulatorState::Building
        } else {
            AccumulatorState::Idle
        }
    }

    /// 진행 중인 매치 후보
    pub fn candidate(&self) -> Option<&Match> {
        self.candidate.as_ref()
    }

    /// 지금까지 완성된 매치 (완성 순서)
    pub fn completed(&self) -> &[Match] {
        &self.completed
    }

    /// 엔트리 하나를 처리합니다. 조각이 아닌 엔트리는 무시합니다.
    pub fn feed(&mut self, entry: &LogEntry<'_>) {
        match self.parser.classifier().fragment_kind(entry) {
            Some(EventKind::MatchCourse) => self.on_course(entry),
            Some(EventKind::MatchStart) => self.on_start(entry),
            Some(EventKind::MatchEnd) => self.on_end(entry),
            _ => {}
        }
    }

    /// 누적을 끝내고 완성된 매치를 반환합니다.
    pub fn finish(self) -> Vec<Match> {
        if let Some(candidate) = &self.candidate {
            debug!(
                match_id = candidate.match_id.as_str(),
                "unfinished match dropped at end of input"
            );
        }
        self.completed
    }

    fn on_course(&mut self, entry: &LogEntry<'_>) {
        let kind = EventKind::MatchCourse;
        // 새 코스 조각은 항상 새 후보를 시작
        if let Some(previous) = self.candidate.take() {
            discarded(&previous, kind);
        }

        let Some(payload) = self.payload(entry, kind) else {
            return;
        };
        match extract_json::<CourseFragment>(payload) {
            Ok(fragment) => {
                debug!(
                    entry = entry.index(),
                    deck = fragment
                        .course_deck
                        .as_ref()
                        .map_or("", |deck| deck.name.as_str()),
                    "match course recorded"
                );
                self.candidate = Some(Match {
                    course_deck: fragment.course_deck,
                    ..Match::default()
                });
            }
            Err(e) => self.decode_failed(entry, kind, payload, &e),
        }
    }

    fn on_start(&mut self, entry: &LogEntry<'_>) {
        let kind = EventKind::MatchStart;
        let Some(payload) = self.payload(entry, kind) else {
            return;
        };
        let json = payload
            .strip_prefix(self.parser.config().match_start_prefix.as_str())
            .unwrap_or(payload);

        let mut started = match serde_json::from_str::<Match>(json) {
            Ok(started) => started,
            Err(e) => {
                let e = LogParserError::Decode {
                    kind,
                    reason: e.to_string(),
                };
                self.decode_failed(entry, kind, json, &e);
                return;
            }
        };

        if started.match_id.is_empty() {
            let e = LogParserError::MalformedFragment {
                kind,
                reason: "missing matchId".to_owned(),
            };
            debug!(entry = entry.index(), error = %e, "skipping match start fragment");
            return;
        }

        if let Some(previous) = self.candidate.take() {
            if previous.match_id.is_empty() {
                // 코스 조각만 받은 후보: 덱을 이어받음
                if started.course_deck.is_none() {
                    started.course_deck = previous.course_deck;
                }
            } else {
                discarded(&previous, kind);
            }
        }

        debug!(
            match_id = started.match_id.as_str(),
            event_id = started.event_id.as_str(),
            "match started"
        );
        self.candidate = Some(started);
    }

    fn on_end(&mut self, entry: &LogEntry<'_>) {
        let kind = EventKind::MatchEnd;
        if self.candidate.is_none() {
            debug!(
                entry = entry.index(),
                "end fragment without match in progress, ignoring"
            );
            metrics::counter!(m::LOG_PARSER_ORPHAN_END_FRAGMENTS_TOTAL).increment(1);
            return;
        }

        let Some(payload) = self.payload(entry, kind) else {
            return;
        };
        let result = serde_json::from_str::<MatchEndEnvelope>(payload)
            .map_err(|e| LogParserError::Decode {
                kind,
                reason: e.to_string(),
            })
            .and_then(MatchEndEnvelope::into_result);

        match result {
            Ok(result) => {
                if let Some(mut finished) = self.candidate.take() {
                    finished.apply_result(result);
                    info!(
                        match_id = finished.match_id.as_str(),
                        winning_team_id = ?finished.winning_team_id,
                        "match completed"
                    );
                    metrics::counter!(m::LOG_PARSER_MATCHES_COMPLETED_TOTAL).increment(1);
                    self.completed.push(finished);
                }
            }
            Err(e @ LogParserError::MalformedFragment { .. }) => {
                debug!(entry = entry.index(), error = %e, "skipping match end fragment");
            }
            Err(e) => self.decode_failed(entry, kind, payload, &e),
        }
    }

    /// 조각의 오프셋 라인부터의 텍스트. 라인이 모자라면 건너뜁니다.
    fn payload<'a>(&self, entry: &LogEntry<'a>, kind: EventKind) -> Option<&'a str> {
        let payload = entry.payload_from(self.parser.offset(kind));
        if payload.is_none() {
            debug!(
                kind = %kind,
                entry = entry.index(),
                "fragment too short for payload offset, skipping"
            );
        }
        payload
    }

    fn decode_failed(
        &self,
        entry: &LogEntry<'_>,
        kind: EventKind,
        payload: &str,
        error: &LogParserError,
    ) {
        warn!(
            kind = %kind,
            entry = entry.index(),
            error = %error,
            snippet = snippet(payload, self.parser.config().decode_snippet_chars),
            "failed to decode match fragment, skipping"
        );
        metrics::counter!(m::LOG_PARSER_DECODE_FAILURES_TOTAL, m::LABEL_KIND => kind.as_str())
            .increment(1);
    }
}

fn discarded(previous: &Match, by: EventKind) {
    debug!(
        match_id = previous.match_id.as_str(),
        by = %by,
        "unfinished match candidate discarded"
    );
    metrics::counter!(m::LOG_PARSER_CANDIDATES_DISCARDED_TOTAL).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(deck: &str) -> String {
        format!(
            "[UnityCrossThreadLogger]1/1/2019 10:00:00 AM\n<== Event.GetPlayerCourse(40)\n\
             {{\"Id\":\"c1\",\"CourseDeck\":{{\"id\":\"{deck}\",\"name\":\"{deck}\",\"mainDeck\":[]}}}}\n\
             (Filename: C:/buildslave/log.cpp Line: 50)\n"
        )
    }

    fn start(id: &str) -> String {
        format!(
            "[UnityCrossThreadLogger]1/1/2019 10:01:00 AM\n\
             (-1) Incoming Event.MatchCreated {{\"matchId\":\"{id}\",\"opponentScreenName\":\"Rival\",\
             \"opponentRankingClass\":\"Gold\",\"opponentRankingTier\":2,\"eventId\":\"Ladder\"}}\n"
        )
    }

    fn end(id: &str) -> String {
        format!(
            "[UnityCrossThreadLogger]1/1/2019 10:20:00 AM\n==> Log.Info(1):\n\
             {{\"params\":{{\"messageName\":\"DuelScene.GameStop\",\"matchId\":\"{id}\",\
             \"payloadObject\":{{\"seatId\":1,\"teamId\":1,\"gameNumber\":1,\"winningTeamId\":2,\
             \"winningReason\":\"ResultReason_Concede\",\"turnCount\":9,\"secondsCount\":612}}}}}}\n"
        )
    }

    fn run(parts: &[String]) -> Vec<Match> {
        let parser = GameLogParser::with_defaults().unwrap();
        parser.parse_matches(&parts.concat())
    }

    #[test]
    fn start_then_end_completes_one_match() {
        let matches = run(&[start("A"), end("A")]);
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.match_id, "A");
        assert_eq!(m.opponent_screen_name, "Rival");
        assert_eq!(m.seat_id, Some(1));
        assert_eq!(m.team_id, Some(1));
        assert_eq!(m.game_number, Some(1));
        assert_eq!(m.winning_team_id, Some(2));
        assert_eq!(m.winning_reason.as_deref(), Some("ResultReason_Concede"));
        assert_eq!(m.turn_count, Some(9));
        assert_eq!(m.seconds_count, Some(612));
        assert!(m.course_deck.is_none());
    }

    #[test]
    fn second_start_discards_first_candidate() {
        let matches = run(&[start("A"), start("B"), end("B")]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_id, "B");
    }

    #[test]
    fn course_deck_carries_into_started_match() {
        let matches = run(&[course("deckX"), start("A"), end("A")]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_id, "A");
        let deck = matches[0].course_deck.as_ref().unwrap();
        assert_eq!(deck.id, "deckX");
    }

    #[test]
    fn null_fields_in_fragments_do_not_drop_the_match() {
        let course = "[UnityCrossThreadLogger]1/1/2019 10:00:00 AM\n<== Event.GetPlayerCourse(40)\n\
            {\"Id\":\"c1\",\"CourseDeck\":{\"id\":\"deckX\",\"name\":\"X\",\"description\":null,\
            \"mainDeck\":[],\"sideboard\":null}}\n"
            .to_owned();
        let start = "[UnityCrossThreadLogger]1/1/2019 10:01:00 AM\n\
            (-1) Incoming Event.MatchCreated {\"matchId\":\"A\",\"opponentScreenName\":\"Rival\",\
            \"opponentRankingClass\":null,\"opponentRankingTier\":null,\"eventId\":null}\n"
            .to_owned();

        let matches = run(&[course, start, end("A")]);
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.match_id, "A");
        assert_eq!(m.opponent_ranking_class, "");
        assert_eq!(m.opponent_ranking_tier, 0);
        assert_eq!(m.course_deck.as_ref().map(|d| d.id.as_str()), Some("deckX"));
        assert_eq!(m.seat_id, Some(1));
    }

    #[test]
    fn course_deck_does_not_follow_a_replacing_start() {
        let matches = run(&[course("deckX"), start("A"), start("B"), end("B")]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_id, "B");
        assert!(matches[0].course_deck.is_none());
    }

    #[test]
    fn orphan_end_is_ignored() {
        assert!(run(&[end("A")]).is_empty());
    }

    #[test]
    fn completed_matches_keep_completion_order() {
        let matches = run(&[start("A"), end("A"), course("d"), start("B"), end("B")]);
        let ids: Vec<_> = matches.iter().map(|m| m.match_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert!(matches[0].course_deck.is_none());
        assert!(matches[1].course_deck.is_some());
    }

    #[test]
    fn end_after_completion_is_orphan() {
        let matches = run(&[start("A"), end("A"), end("A")]);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn new_course_resets_started_candidate() {
        // 코스 조각이 새 후보를 시작하므로 A는 버려지고 덱만 있는 후보가 완성됨
        let matches = run(&[start("A"), course("d2"), end("A")]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_id, "");
        assert_eq!(matches[0].course_deck.as_ref().unwrap().id, "d2");
    }

    #[test]
    fn broken_start_keeps_prior_candidate() {
        let broken = "[UnityCrossThreadLogger]t\n(-1) Incoming Event.MatchCreated {\"matchId\":\n".to_owned();
        let matches = run(&[start("A"), broken, end("A")]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_id, "A");
    }

    #[test]
    fn broken_course_leaves_idle() {
        let broken = "[UnityCrossThreadLogger]t\n<== Event.GetPlayerCourse(1)\nnot json\n".to_owned();
        let matches = run(&[start("A"), broken, end("A")]);
        assert!(matches.is_empty());
    }

    #[test]
    fn end_without_payload_object_keeps_candidate() {
        let malformed =
            "[UnityCrossThreadLogger]t\n==> Log.Info(1):\n{\"params\":{\"messageName\":\"DuelScene.GameStop\"}}\n"
                .to_owned();
        let matches = run(&[start("A"), malformed, end("A")]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].winning_team_id, Some(2));
    }

    #[test]
    fn start_without_match_id_is_skipped() {
        let raw = "[UnityCrossThreadLogger]t\n(-1) Incoming Event.MatchCreated {\"eventId\":\"Ladder\"}\n";
        let parser = GameLogParser::with_defaults().unwrap();
        let mut acc = MatchAccumulator::new(&parser);
        for entry in parser.entries(raw, EventKind::MatchStart) {
            acc.feed(&entry);
        }
        assert_eq!(acc.state(), AccumulatorState::Idle);
    }

    #[test]
    fn state_tracks_candidate() {
        let parser = GameLogParser::with_defaults().unwrap();
        let raw = start("A");
        let mut acc = MatchAccumulator::new(&parser);
        assert_eq!(acc.state(), AccumulatorState::Idle);
        for entry in parser.entries(&raw, EventKind::MatchStart) {
            acc.feed(&entry);
        }
        assert_eq!(acc.state(), AccumulatorState::Building);
        assert_eq!(acc.candidate().unwrap().match_id, "A");
        assert!(acc.completed().is_empty());
        assert!(acc.finish().is_empty());
    }

    #[test]
    fn client_gre_lines_split_fragments() {
        let raw = format!(
            "{}[Client GRE]1/1/2019 10:10:00 AM: Match to P1: GREMessageType_GameStateMessage\n{{}}\n{}",
            start("A"),
            end("A")
        );
        let parser = GameLogParser::with_defaults().unwrap();
        assert_eq!(parser.parse_matches(&raw).len(), 1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Fragment {
            Course,
            Start(u8),
            End,
            Noise,
        }

        fn fragment() -> impl Strategy<Value = Fragment> {
            prop_oneof![
                Just(Fragment::Course),
                (0u8..4).prop_map(Fragment::Start),
                Just(Fragment::End),
                Just(Fragment::Noise),
            ]
        }

        proptest! {
            #[test]
            fn accumulator_matches_single_slot_model(fragments in prop::collection::vec(fragment(), 0..24)) {
                let mut raw = String::new();
                // 모델: (후보 ID, 덱 유무)
                let mut candidate: Option<(String, bool)> = None;
                let mut expected: Vec<(String, bool)> = Vec::new();

                for f in &fragments {
                    match f {
                        Fragment::Course => {
                            raw.push_str(&course("d"));
                            candidate = Some((String::new(), true));
                        }
                        Fragment::Start(n) => {
                            let id = format!("M{n}");
                            raw.push_str(&start(&id));
                            let deck = matches!(&candidate, Some((prev, true)) if prev.is_empty());
                            candidate = Some((id, deck));
                        }
                        Fragment::End => {
                            raw.push_str(&end("x"));
                            if let Some(done) = candidate.take() {
                                expected.push(done);
                            }
                        }
                        Fragment::Noise => raw.push_str("[UnityCrossThreadLogger]noise\n==> Deck.GetDeckLists(1)\n{}\n"),
                    }
                }

                let parser = GameLogParser::with_defaults().unwrap();
                let actual: Vec<(String, bool)> = parser
                    .parse_matches(&raw)
                    .into_iter()
                    .map(|m| (m.match_id, m.course_deck.is_some()))
                    .collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
