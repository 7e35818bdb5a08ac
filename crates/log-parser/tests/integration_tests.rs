//! 통합 테스트 -- 실제 클라이언트 로그 형태의 픽스처로 전체 파싱 흐름 검증
//!
//! 픽스처는 스냅샷, 인증, 매치 조각이 섞여 있고 `[Client GRE]` 라인과
//! 뒤쪽 잡음 라인이 포함된 로그입니다.

use gathering_core::config::GatheringConfig;
use gathering_core::error::{GatheringError, ParseError};
use gathering_core::types::{EventKind, UploadPayload};
use gathering_log_parser::{GameLogParser, LogParserError, MatchAccumulator, ParserConfig};

const OUTPUT_LOG: &str = include_str!("fixtures/output_log.txt");

fn parser() -> GameLogParser {
    GameLogParser::with_defaults().expect("default parser config must compile")
}

#[test]
fn test_parse_all_extracts_every_entity() {
    let payload = parser().parse_all(OUTPUT_LOG);

    assert_eq!(
        payload.present_fields(),
        vec!["collection", "deck", "inventory", "rank", "auth", "matches"]
    );

    let collection = payload.collection.as_ref().unwrap();
    assert_eq!(collection.quantity("66091"), Some(4));
    assert_eq!(collection.total_cards(), 7);

    let decks = payload.decks.as_ref().unwrap();
    assert_eq!(decks.len(), 2);
    assert_eq!(decks[0].name, "Mono Red");
    assert_eq!(decks[0].main_deck_size(), 24);
    assert_eq!(decks[0].sideboard[0].id, "66095");
    assert_eq!(decks[1].description, "slow");

    let auth = payload.auth.as_ref().unwrap();
    assert_eq!(auth.player_name(), "Tester#12345");

    let rank = payload.rank.as_ref().unwrap();
    assert_eq!(rank.constructed().class, Some("Gold"));
    assert_eq!(rank.limited().matches_lost, Some(2));
}

#[test]
fn test_latest_inventory_snapshot_wins() {
    let inventory = parser().parse_inventory(OUTPUT_LOG).unwrap();
    assert_eq!(inventory.gold, 2750);
    assert_eq!(inventory.draft_tokens, 1);
    assert!((inventory.vault_fraction() - 0.28).abs() < 1e-9);
}

#[test]
fn test_matches_correlate_fragments_in_order() {
    let matches = parser().parse_matches(OUTPUT_LOG);
    let ids: Vec<_> = matches.iter().map(|m| m.match_id.as_str()).collect();
    // match-b는 match-c 시작으로 버려지고, match-d는 종료 조각이 없음
    assert_eq!(ids, vec!["match-a", "match-c"]);

    let first = &matches[0];
    assert_eq!(first.opponent_screen_name, "Rival#1");
    assert_eq!(first.event_id, "Ladder");
    assert_eq!(first.winning_reason.as_deref(), Some("ResultReason_Game"));
    assert_eq!(first.seconds_count, Some(840));
    let deck = first.course_deck.as_ref().expect("course deck carried");
    assert_eq!(deck.name, "Mono Red");

    let second = &matches[1];
    assert_eq!(second.opponent_ranking_class, "Mythic");
    assert_eq!(second.opponent_mythic_leaderboard_place, 130);
    assert_eq!(second.seat_id, Some(2));
    assert_eq!(second.winning_team_id, Some(1));
    assert!(second.course_deck.is_none());
}

#[test]
fn test_manual_accumulation_matches_parse_matches() {
    let parser = parser();
    let mut accumulator = MatchAccumulator::new(&parser);
    for entry in parser.entries(OUTPUT_LOG, EventKind::MatchStart) {
        accumulator.feed(&entry);
    }
    // 마지막 매치는 진행 중
    assert_eq!(accumulator.candidate().unwrap().match_id, "match-d");
    assert_eq!(accumulator.finish(), parser.parse_matches(OUTPUT_LOG));
}

#[test]
fn test_payload_serializes_with_wire_keys() {
    let payload = parser().parse_all(OUTPUT_LOG);
    let json = serde_json::to_value(&payload).unwrap();

    assert!(json.get("deck").is_some());
    assert!(json.get("decks").is_none());
    assert_eq!(json["auth"]["Payload"]["PlayerName"], "Tester#12345");
    assert_eq!(json["matches"][0]["matchId"], "match-a");
    assert_eq!(json["matches"][0]["CourseDeck"]["name"], "Mono Red");
    assert!(json["matches"][1]["CourseDeck"].is_null());

    let back: UploadPayload = serde_json::from_value(json).unwrap();
    assert_eq!(back, payload);
}

#[test]
fn test_log_without_markers_yields_empty_payload() {
    let payload = parser().parse_all("Initialize engine version: 2018.3.0f2\nnothing else\n");
    assert!(payload.is_empty());
    assert_eq!(serde_json::to_string(&payload).unwrap(), "{}");
}

#[test]
fn test_truncated_log_keeps_other_entities() {
    // 덱 목록 JSON 중간에서 잘린 로그
    let cut = OUTPUT_LOG.find("\"name\": \"Azorius Control\"").unwrap();
    let truncated = &OUTPUT_LOG[..cut];
    let payload = parser().parse_all(truncated);
    assert!(payload.decks.is_none());
    assert!(payload.collection.is_some());
    assert!(payload.inventory.is_none());
}

#[test]
fn test_parser_from_core_config() {
    let toml = r#"
[parser]
max_input_bytes = 64
"#;
    let config = GatheringConfig::parse(toml).unwrap();
    let parser = GameLogParser::new(ParserConfig::from_core(&config.parser)).unwrap();
    assert!(parser.parse_all(OUTPUT_LOG).is_empty());
    assert!(matches!(
        parser.check_input_size(OUTPUT_LOG),
        Err(LogParserError::InputTooLarge { max: 64, .. })
    ));
}

#[test]
fn test_errors_convert_into_core_taxonomy() {
    let err = parser().parse_collection("").unwrap_err();
    let core: GatheringError = err.into();
    assert!(matches!(
        core,
        GatheringError::Parse(ParseError::NotFound { ref kind }) if kind == "collection"
    ));
}
