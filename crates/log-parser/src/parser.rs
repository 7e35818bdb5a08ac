//! 게임 로그 파서 -- 스냅샷 파서와 전체 패스 조립
//!
//! [`GameLogParser`]는 설정에서 분할기 두 개(굵은/세밀한)와 분류기를 한 번 컴파일해 두고,
//! 같은 로그 텍스트에 대해 종류별 스냅샷 파서와 매치 누적기를 실행합니다.
//!
//! # 스냅샷 선택 규칙
//! - 분류기에 매칭되는 엔트리 중 **마지막** 엔트리가 이깁니다.
//! - 페이로드는 마커 라인에서 종류별 오프셋만큼 떨어진 라인부터 엔트리 끝까지입니다.
//! - 오프셋 라인이 없는 엔트리는 후보가 되지 못하고 이전 후보를 덮어쓰지도 않습니다.
//! - 선택된 마지막 페이로드가 깨져 있어도 이전 스냅샷으로 되돌아가지 않습니다.
//!
//! # 사용 예시
//! ```ignore
//! use gathering_log_parser::GameLogParser;
//!
//! let parser = GameLogParser::with_defaults()?;
//! let payload = parser.parse_all(&raw);
//! println!("found: {:?}", payload.present_fields());
//! ```

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use gathering_core::metrics as m;
use gathering_core::types::{
    AuthRequest, Collection, Deck, EventKind, Granularity, Match, PlayerInventory, RankInfo,
    UploadPayload,
};

use crate::classify::Classifier;
use crate::config::ParserConfig;
use crate::error::LogParserError;
use crate::matches::MatchAccumulator;
use crate::segment::{Segmenter, Segments};

/// 게임 클라이언트 로그 파서
///
/// 파싱 패스 사이에 상태를 갖지 않으므로 `&self`로 여러 번 호출할 수 있습니다.
/// 같은 로그 파일에 대한 호출 직렬화는 호출자의 책임입니다.
#[derive(Debug, Clone)]
pub struct GameLogParser {
    config: ParserConfig,
    coarse: Segmenter,
    fine: Segmenter,
    classifier: Classifier,
}

impl GameLogParser {
    /// 설정을 검증하고 정규식을 컴파일하여 파서를 생성합니다.
    pub fn new(config: ParserConfig) -> Result<Self, LogParserError> {
        config.validate()?;
        let coarse = Segmenter::new(&config.coarse_boundary, Granularity::Coarse)?;
        let fine = Segmenter::new(&config.fine_boundary, Granularity::Fine)?;
        let classifier = Classifier::new(&config.patterns)?;
        Ok(Self {
            config,
            coarse,
            fine,
            classifier,
        })
    }

    /// 기본 설정으로 파서를 생성합니다.
    pub fn with_defaults() -> Result<Self, LogParserError> {
        Self::new(ParserConfig::default())
    }

    /// 파서 설정
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// 분류기
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// 종류에 맞는 분할기
    pub fn segmenter(&self, kind: EventKind) -> &Segmenter {
        match self.config.granularity.get(kind) {
            Granularity::Coarse => &self.coarse,
            Granularity::Fine => &self.fine,
        }
    }

    /// 종류별 페이로드 라인 오프셋
    pub fn offset(&self, kind: EventKind) -> usize {
        *self.config.offsets.get(kind)
    }

    /// 종류에 맞는 분할 단위로 원시 텍스트를 엔트리로 나눕니다.
    pub fn entries<'a>(&'a self, raw: &'a str, kind: EventKind) -> Segments<'a> {
        self.segmenter(kind).segment(raw)
    }

    /// 해당 종류로 분류된 마지막 엔트리의 페이로드
    ///
    /// 오프셋 라인이 없는 엔트리는 건너뜁니다.
    pub fn last_payload<'a>(&'a self, raw: &'a str, kind: EventKind) -> Option<&'a str> {
        let offset = self.offset(kind);
        let mut found = None;
        for entry in self.entries(raw, kind) {
            if !self.classifier.matches(kind, &entry) {
                continue;
            }
            match entry.payload_from(offset) {
                Some(payload) => found = Some(payload),
                None => debug!(
                    kind = %kind,
                    entry = entry.index(),
                    offset,
                    "matching entry too short for payload offset"
                ),
            }
        }
        found
    }

    /// 마지막 스냅샷을 찾아 `T`로 디코딩합니다.
    ///
    /// # 에러
    /// - 매칭 엔트리가 없거나 페이로드가 비어 있음: [`LogParserError::NotFound`]
    /// - 마지막 페이로드 디코딩 실패: [`LogParserError::Decode`]
    pub fn parse_snapshot<T: DeserializeOwned>(
        &self,
        raw: &str,
        kind: EventKind,
    ) -> Result<T, LogParserError> {
        let payload = self
            .last_payload(raw, kind)
            .filter(|payload| !payload.trim().is_empty())
            .ok_or(LogParserError::NotFound { kind })?;

        let value = serde_json::from_str(payload).map_err(|e| {
            metrics::counter!(m::LOG_PARSER_DECODE_FAILURES_TOTAL, m::LABEL_KIND => kind.as_str())
                .increment(1);
            debug!(
                kind = %kind,
                snippet = snippet(payload, self.config.decode_snippet_chars),
                "snapshot payload rejected"
            );
            LogParserError::Decode {
                kind,
                reason: e.to_string(),
            }
        })?;

        metrics::counter!(m::LOG_PARSER_SNAPSHOTS_FOUND_TOTAL, m::LABEL_KIND => kind.as_str())
            .increment(1);
        Ok(value)
    }

    /// 카드 컬렉션 스냅샷
    pub fn parse_collection(&self, raw: &str) -> Result<Collection, LogParserError> {
        self.parse_snapshot(raw, EventKind::Collection)
    }

    /// 덱 목록 스냅샷
    pub fn parse_decks(&self, raw: &str) -> Result<Vec<Deck>, LogParserError> {
        self.parse_snapshot(raw, EventKind::DeckList)
    }

    /// 플레이어 인벤토리 스냅샷
    pub fn parse_inventory(&self, raw: &str) -> Result<PlayerInventory, LogParserError> {
        self.parse_snapshot(raw, EventKind::Inventory)
    }

    /// 랭크 정보 스냅샷
    pub fn parse_rank_info(&self, raw: &str) -> Result<RankInfo, LogParserError> {
        self.parse_snapshot(raw, EventKind::RankInfo)
    }

    /// 가장 최근 인증 요청
    pub fn parse_auth_request(&self, raw: &str) -> Result<AuthRequest, LogParserError> {
        self.parse_snapshot(raw, EventKind::Auth)
    }

    /// 완성된 매치 목록 (완성 순서)
    ///
    /// 조각 단위의 실패는 누적기 내부에서 로그로 남기고 건너뜁니다.
    pub fn parse_matches(&self, raw: &str) -> Vec<Match> {
        let mut accumulator = MatchAccumulator::new(self);
        for entry in self.entries(raw, EventKind::MatchStart) {
            accumulator.feed(&entry);
        }
        accumulator.finish()
    }

    /// 입력 크기가 허용 범위인지 검사합니다.
    pub fn check_input_size(&self, raw: &str) -> Result<(), LogParserError> {
        let max = self.config.max_input_bytes;
        if raw.len() > max {
            return Err(LogParserError::InputTooLarge {
                size: raw.len(),
                max,
            });
        }
        Ok(())
    }

    /// 모든 스냅샷 파서와 매치 누적기를 실행해 업로드 페이로드를 만듭니다.
    ///
    /// 한 종류의 실패가 다른 종류의 추출을 막지 않습니다. 찾지 못한 엔티티는
    /// `debug`, 디코딩 실패는 `warn`으로 남기고 해당 필드를 비워 둡니다.
    /// 크기 제한을 넘는 입력은 경고 후 빈 페이로드를 반환합니다.
    pub fn parse_all(&self, raw: &str) -> UploadPayload {
        if let Err(e) = self.check_input_size(raw) {
            warn!(error = %e, "log input rejected");
            metrics::counter!(m::LOG_PARSER_INPUTS_REJECTED_TOTAL).increment(1);
            return UploadPayload::default();
        }

        let matches = self.parse_matches(raw);
        let payload = UploadPayload {
            collection: found(EventKind::Collection, self.parse_collection(raw)),
            decks: found(EventKind::DeckList, self.parse_decks(raw)),
            inventory: found(EventKind::Inventory, self.parse_inventory(raw)),
            rank: found(EventKind::RankInfo, self.parse_rank_info(raw)),
            auth: found(EventKind::Auth, self.parse_auth_request(raw)),
            matches: (!matches.is_empty()).then_some(matches),
        };

        debug!(
            bytes = raw.len(),
            fields = ?payload.present_fields(),
            "log parse pass complete"
        );
        payload
    }
}

/// 파서 결과를 페이로드 필드로 변환하며 실패를 로그로 남깁니다.
fn found<T>(kind: EventKind, result: Result<T, LogParserError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_not_found() => {
            debug!(kind = %kind, "entity not present in log");
            None
        }
        Err(e) => {
            warn!(kind = %kind, error = %e, "failed to parse entity, leaving it out");
            None
        }
    }
}

/// 로그용 페이로드 앞부분 (문자 경계 보장)
pub(crate) fn snippet(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfigBuilder;

    const DECKS_V1: &str = "[UnityCrossThreadLogger]1/1/2019 10:00:00 AM\n\
        <== Deck.GetDeckLists(10)\n\
        [{\"id\":\"d1\",\"name\":\"Old\",\"mainDeck\":[{\"id\":\"67\",\"quantity\":4}]}]\n";
    const DECKS_V2: &str = "[UnityCrossThreadLogger]1/1/2019 10:05:00 AM\n\
        <== Deck.GetDeckLists(11)\n\
        [{\"id\":\"d2\",\"name\":\"New\",\"mainDeck\":[]}]\n";
    const DECKS_BROKEN: &str = "[UnityCrossThreadLogger]1/1/2019 10:06:00 AM\n\
        <== Deck.GetDeckLists(12)\n\
        [{\"id\":\"d3\",\"name\":\n";

    fn parser() -> GameLogParser {
        GameLogParser::with_defaults().unwrap()
    }

    #[test]
    fn absent_marker_is_not_found() {
        let err = parser().parse_decks("[UnityCrossThreadLogger]nothing here\n").unwrap_err();
        assert!(err.is_not_found());
        assert!(parser().parse_collection("").unwrap_err().is_not_found());
    }

    #[test]
    fn last_snapshot_wins() {
        let raw = format!("{DECKS_V1}{DECKS_V2}");
        let decks = parser().parse_decks(&raw).unwrap();
        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].id, "d2");
    }

    #[test]
    fn broken_latest_snapshot_does_not_fall_back() {
        let raw = format!("{DECKS_V1}{DECKS_BROKEN}");
        let err = parser().parse_decks(&raw).unwrap_err();
        assert!(matches!(
            err,
            LogParserError::Decode {
                kind: EventKind::DeckList,
                ..
            }
        ));
    }

    #[test]
    fn short_entry_does_not_overwrite_earlier_snapshot() {
        let raw = format!("{DECKS_V1}[UnityCrossThreadLogger]<== Deck.GetDeckLists(13)");
        let decks = parser().parse_decks(&raw).unwrap();
        assert_eq!(decks[0].id, "d1");
    }

    #[test]
    fn empty_payload_line_is_not_found() {
        let raw = "[UnityCrossThreadLogger]t\n<== Deck.GetDeckLists(13)\n\n";
        assert!(parser().parse_decks(raw).unwrap_err().is_not_found());
    }

    #[test]
    fn auth_uses_fine_boundary_and_offset_one() {
        let raw = "[UnityCrossThreadLogger]1/1/2019 10:00:00 AM\n\
            noise [Client GRE]ClientToMatchServiceMessageType_AuthenticateRequest\n\
            {\"Payload\":{\"PlayerName\":\"Tester#12345\"}}\n";
        let auth = parser().parse_auth_request(raw).unwrap();
        assert_eq!(auth.player_name(), "Tester#12345");
    }

    #[test]
    fn inventory_and_rank_decode() {
        let raw = "[UnityCrossThreadLogger]t\n<== PlayerInventory.GetPlayerInventory(5)\n\
            {\"playerId\":\"P1\",\"wcRare\":3,\"gems\":1200,\"vaultProgress\":45.5}\n\
            [UnityCrossThreadLogger]t\n<== Event.GetCombinedRankInfo(6)\n\
            {\"constructedClass\":\"Gold\",\"constructedLevel\":2,\"limitedClass\":null}\n";
        let p = parser();
        let inventory = p.parse_inventory(raw).unwrap();
        assert_eq!(inventory.player_id, "P1");
        assert_eq!(inventory.wc_rare, 3);
        assert_eq!(inventory.gems, 1200);
        let rank = p.parse_rank_info(raw).unwrap();
        assert_eq!(rank.constructed().class, Some("Gold"));
        assert_eq!(rank.constructed().level, Some(2));
        assert_eq!(rank.limited().class, None);
        assert_eq!(rank.limited().step, None);
    }

    #[test]
    fn collection_decodes_flat_map() {
        let raw = "[UnityCrossThreadLogger]t\n<== PlayerInventory.GetPlayerCardsV3(3)\n\
            {\"66091\":4,\"66093\":1}\n";
        let collection = parser().parse_collection(raw).unwrap();
        assert_eq!(collection.quantity("66091"), Some(4));
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn parse_all_isolates_failures() {
        let raw = format!(
            "{DECKS_BROKEN}[UnityCrossThreadLogger]t\n<== PlayerInventory.GetPlayerCardsV3(3)\n{{\"1\":2}}\n"
        );
        let payload = parser().parse_all(&raw);
        assert!(payload.decks.is_none());
        assert_eq!(payload.collection.unwrap().quantity("1"), Some(2));
        assert!(payload.matches.is_none());
        assert!(payload.auth.is_none());
    }

    #[test]
    fn parse_all_rejects_oversized_input() {
        let config = ParserConfigBuilder::new().max_input_bytes(16).build().unwrap();
        let parser = GameLogParser::new(config).unwrap();
        assert!(matches!(
            parser.check_input_size(DECKS_V1),
            Err(LogParserError::InputTooLarge { max: 16, .. })
        ));
        assert!(parser.parse_all(DECKS_V1).is_empty());
    }

    #[test]
    fn custom_offset_moves_payload_line() {
        let config = ParserConfigBuilder::new()
            .offset(EventKind::DeckList, 3)
            .build()
            .unwrap();
        let parser = GameLogParser::new(config).unwrap();
        let raw = "[UnityCrossThreadLogger]t\n<== Deck.GetDeckLists(1)\nextra header\n[]\n";
        assert_eq!(parser.parse_decks(raw).unwrap(), Vec::<Deck>::new());
    }

    #[test]
    fn segmenter_follows_granularity() {
        let p = parser();
        assert_eq!(p.segmenter(EventKind::DeckList).granularity(), Granularity::Coarse);
        assert_eq!(p.segmenter(EventKind::MatchEnd).granularity(), Granularity::Fine);
        assert_eq!(p.offset(EventKind::Auth), 1);
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        assert_eq!(snippet("한글 텍스트", 2), "한글");
        assert_eq!(snippet("short", 100), "short");
        assert_eq!(snippet("abc", 0), "");
    }

    #[test]
    fn deck_list_with_null_fields_decodes() {
        let raw = "[UnityCrossThreadLogger]1/1/2019 10:00:00 AM\n\
            <== Deck.GetDeckLists(10)\n\
            [{\"id\":\"d1\",\"name\":\"Mono Red\",\"description\":null,\"format\":null,\
            \"resourceId\":null,\"deckTileId\":null,\"mainDeck\":[{\"id\":\"67\",\"quantity\":4}],\
            \"sideboard\":null}]\n";
        let decks = parser().parse_decks(raw).unwrap();
        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].name, "Mono Red");
        assert_eq!(decks[0].description, "");
        assert_eq!(decks[0].main_deck_size(), 4);
        assert!(decks[0].sideboard.is_empty());
    }

    mod proptests {
        use super::*;
        use gathering_core::config::LogParserConfig;
        use proptest::prelude::*;
        use regex::Regex;

        fn line() -> impl Strategy<Value = String> {
            prop_oneof![
                Just("[UnityCrossThreadLogger]1/1/2019 10:00:00 AM".to_owned()),
                Just("[Client GRE]noise".to_owned()),
                Just("==> Deck.GetDeckLists(3)".to_owned()),
                Just("<== PlayerInventory.GetPlayerCards(1)".to_owned()),
                Just("Incoming Event.MatchStarted".to_owned()),
                Just("{\"matchId\":\"A\",\"payloadObject\":{}}".to_owned()),
                Just("[{\"id\":\"d1\"}]".to_owned()),
                Just(String::new()),
                "\\PC{0,40}",
            ]
        }

        fn contains_marker(raw: &str) -> bool {
            let patterns = LogParserConfig::default().patterns;
            EventKind::ALL
                .into_iter()
                .any(|kind| Regex::new(patterns.get(kind)).unwrap().is_match(raw))
        }

        proptest! {
            #[test]
            fn marker_free_text_is_not_found_for_every_kind(
                lines in prop::collection::vec(line(), 0..24)
            ) {
                let raw = lines.join("\n");
                prop_assume!(!contains_marker(&raw));

                let p = parser();
                prop_assert!(p.parse_collection(&raw).unwrap_err().is_not_found());
                prop_assert!(p.parse_decks(&raw).unwrap_err().is_not_found());
                prop_assert!(p.parse_inventory(&raw).unwrap_err().is_not_found());
                prop_assert!(p.parse_rank_info(&raw).unwrap_err().is_not_found());
                prop_assert!(p.parse_auth_request(&raw).unwrap_err().is_not_found());
                prop_assert!(p.parse_matches(&raw).is_empty());
            }
        }
    }
}
