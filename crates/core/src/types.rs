//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 게임 클라이언트 로그에서 추출되는 엔티티와 업로드 페이로드를 정의합니다.
//! 모든 타입의 serde 표현은 클라이언트 로그에 기록된 JSON 키 이름을 그대로 따릅니다.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// 로그 이벤트 종류
///
/// 분류기(classifier) 하나가 하나의 종류를 담당합니다.
/// `MatchCourse`, `MatchStart`, `MatchEnd`는 매치 하나를 구성하는 세 조각(fragment)입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// 카드 컬렉션 스냅샷
    Collection,
    /// 덱 목록 스냅샷
    DeckList,
    /// 플레이어 인벤토리 스냅샷
    Inventory,
    /// 랭크 정보 스냅샷
    RankInfo,
    /// 인증(로그인) 요청
    Auth,
    /// 매치 코스 조각 — 큐 진입 시 사용한 덱
    MatchCourse,
    /// 매치 시작 조각
    MatchStart,
    /// 매치 종료 조각
    MatchEnd,
}

impl EventKind {
    /// 모든 이벤트 종류 (분류기 등록 순서)
    pub const ALL: [EventKind; 8] = [
        EventKind::Collection,
        EventKind::DeckList,
        EventKind::Inventory,
        EventKind::RankInfo,
        EventKind::Auth,
        EventKind::MatchCourse,
        EventKind::MatchStart,
        EventKind::MatchEnd,
    ];

    /// 매치 조각 종류
    pub const FRAGMENTS: [EventKind; 3] = [
        EventKind::MatchCourse,
        EventKind::MatchStart,
        EventKind::MatchEnd,
    ];

    /// 로그/메트릭 레이블에 쓰이는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::DeckList => "deck_list",
            Self::Inventory => "inventory",
            Self::RankInfo => "rank_info",
            Self::Auth => "auth",
            Self::MatchCourse => "match_course",
            Self::MatchStart => "match_start",
            Self::MatchEnd => "match_end",
        }
    }

    /// 매치 조각 여부
    pub fn is_fragment(&self) -> bool {
        Self::FRAGMENTS.contains(self)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 로그 분할 단위
///
/// 굵은(coarse) 경계는 스냅샷 이벤트만 구분하고, 세밀한(fine) 경계는
/// 인증/매치 라인까지 별도 엔트리로 분리합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// 스냅샷 이벤트용 경계
    #[default]
    Coarse,
    /// 인증/매치 라인까지 잡아내는 경계
    Fine,
}

impl Granularity {
    /// 로그/메트릭 레이블에 쓰이는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coarse => "coarse",
            Self::Fine => "fine",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 카드 컬렉션 — 카드 ID에서 보유 수량으로의 매핑
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection(pub BTreeMap<String, u32>);

impl Collection {
    /// 카드 보유 수량. 없는 카드는 `None`.
    pub fn quantity(&self, card_id: &str) -> Option<u32> {
        self.0.get(card_id).copied()
    }

    /// 서로 다른 카드 종류 수
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 전체 카드 장수
    pub fn total_cards(&self) -> u64 {
        self.0.values().map(|&q| u64::from(q)).sum()
    }
}

/// 값이 `null`이면 타입의 기본값으로 디코딩합니다.
///
/// 클라이언트는 비어 있는 문자열/숫자 필드를 `null`로 기록하기도 합니다.
/// 키가 없는 경우는 컨테이너의 `#[serde(default)]`가 처리합니다.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 덱에 포함된 카드 한 줄
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckCard {
    /// 카드 ID
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// 수량
    #[serde(deserialize_with = "null_as_default")]
    pub quantity: u32,
}

/// 덱
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Deck {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub format: String,
    #[serde(deserialize_with = "null_as_default")]
    pub resource_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub deck_tile_id: i64,
    /// 메인 덱 (기록 순서 유지)
    #[serde(deserialize_with = "null_as_default")]
    pub main_deck: Vec<DeckCard>,
    /// 사이드보드 (기록 순서 유지)
    #[serde(deserialize_with = "null_as_default")]
    pub sideboard: Vec<DeckCard>,
}

impl Deck {
    /// 메인 덱 카드 장수
    pub fn main_deck_size(&self) -> u32 {
        self.main_deck.iter().map(|c| c.quantity).sum()
    }
}

/// 플레이어 인벤토리
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerInventory {
    #[serde(deserialize_with = "null_as_default")]
    pub player_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub wc_common: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub wc_uncommon: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub wc_rare: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub wc_mythic: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub gold: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub gems: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub draft_tokens: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub sealed_tokens: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub wc_track_position: u32,
    /// 볼트 진행도. 클라이언트 버전에 따라 비율(0~1) 또는 백분율로 기록됩니다.
    #[serde(deserialize_with = "null_as_default")]
    pub vault_progress: f64,
}

impl PlayerInventory {
    /// 볼트 진행도를 [0, 1] 구간의 비율로 반환합니다.
    ///
    /// 1보다 큰 값은 백분율로 간주합니다.
    pub fn vault_fraction(&self) -> f64 {
        let raw = if self.vault_progress > 1.0 {
            self.vault_progress / 100.0
        } else {
            self.vault_progress
        };
        raw.clamp(0.0, 1.0)
    }
}

/// 랭크 정보 — 구성(constructed)과 제한(limited) 두 트랙
///
/// 각 필드는 개별적으로 선택적입니다. `None`은 0이 아니라
/// "이번 스냅샷에 없음"을 뜻하며, 직렬화 시 명시적 `null`로 유지됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankInfo {
    #[serde(default)]
    pub constructed_season_ordinal: Option<u32>,
    #[serde(default)]
    pub constructed_class: Option<String>,
    #[serde(default)]
    pub constructed_level: Option<u32>,
    #[serde(default)]
    pub constructed_step: Option<u32>,
    #[serde(default)]
    pub constructed_matches_won: Option<u32>,
    #[serde(default)]
    pub constructed_matches_lost: Option<u32>,
    #[serde(default)]
    pub constructed_matches_drawn: Option<u32>,
    #[serde(default)]
    pub limited_season_ordinal: Option<u32>,
    #[serde(default)]
    pub limited_class: Option<String>,
    #[serde(default)]
    pub limited_level: Option<u32>,
    #[serde(default)]
    pub limited_step: Option<u32>,
    #[serde(default)]
    pub limited_matches_won: Option<u32>,
    #[serde(default)]
    pub limited_matches_lost: Option<u32>,
    #[serde(default)]
    pub limited_matches_drawn: Option<u32>,
}

/// 랭크 트랙 하나에 대한 읽기 전용 뷰
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankTrack<'a> {
    pub season_ordinal: Option<u32>,
    pub class: Option<&'a str>,
    pub level: Option<u32>,
    pub step: Option<u32>,
    pub matches_won: Option<u32>,
    pub matches_lost: Option<u32>,
    pub matches_drawn: Option<u32>,
}

impl RankInfo {
    /// 구성(constructed) 트랙
    pub fn constructed(&self) -> RankTrack<'_> {
        RankTrack {
            season_ordinal: self.constructed_season_ordinal,
            class: self.constructed_class.as_deref(),
            level: self.constructed_level,
            step: self.constructed_step,
            matches_won: self.constructed_matches_won,
            matches_lost: self.constructed_matches_lost,
            matches_drawn: self.constructed_matches_drawn,
        }
    }

    /// 제한(limited) 트랙
    pub fn limited(&self) -> RankTrack<'_> {
        RankTrack {
            season_ordinal: self.limited_season_ordinal,
            class: self.limited_class.as_deref(),
            level: self.limited_level,
            step: self.limited_step,
            matches_won: self.limited_matches_won,
            matches_lost: self.limited_matches_lost,
            matches_drawn: self.limited_matches_drawn,
        }
    }
}

/// 인증 요청 본문 — 플레이어 표시 이름만 사용합니다
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequestPayload {
    #[serde(rename = "PlayerName", default, deserialize_with = "null_as_default")]
    pub player_name: String,
}

/// 가장 최근 인증 요청
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    #[serde(rename = "Payload", default, deserialize_with = "null_as_default")]
    pub payload: AuthRequestPayload,
}

impl AuthRequest {
    pub fn player_name(&self) -> &str {
        &self.payload.player_name
    }
}

/// 매치 종료 조각에 기록된 결과 필드
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    #[serde(default)]
    pub seat_id: Option<u32>,
    #[serde(default)]
    pub team_id: Option<u32>,
    #[serde(default)]
    pub game_number: Option<u32>,
    #[serde(default)]
    pub winning_team_id: Option<u32>,
    #[serde(default)]
    pub winning_reason: Option<String>,
    #[serde(default)]
    pub turn_count: Option<u32>,
    #[serde(default)]
    pub seconds_count: Option<u64>,
}

/// 매치
///
/// 세 조각에서 점진적으로 채워집니다.
/// - 코스 조각: `course_deck`
/// - 시작 조각: 매치 ID, 상대 정보, 이벤트 ID
/// - 종료 조각: 좌석/팀/게임 번호, 승리 팀과 사유, 턴 수, 경과 시간
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Match {
    #[serde(deserialize_with = "null_as_default")]
    pub match_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub opponent_screen_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub opponent_is_wotc: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub opponent_ranking_class: String,
    #[serde(deserialize_with = "null_as_default")]
    pub opponent_ranking_tier: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub opponent_mythic_percentile: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub opponent_mythic_leaderboard_place: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub event_id: String,
    pub seat_id: Option<u32>,
    pub team_id: Option<u32>,
    pub game_number: Option<u32>,
    pub winning_team_id: Option<u32>,
    pub winning_reason: Option<String>,
    pub turn_count: Option<u32>,
    pub seconds_count: Option<u64>,
    #[serde(rename = "CourseDeck")]
    pub course_deck: Option<Deck>,
}

impl Match {
    /// 종료 조각의 결과 필드를 매치에 복사합니다.
    pub fn apply_result(&mut self, result: MatchResult) {
        self.seat_id = result.seat_id;
        self.team_id = result.team_id;
        self.game_number = result.game_number;
        self.winning_team_id = result.winning_team_id;
        self.winning_reason = result.winning_reason;
        self.turn_count = result.turn_count;
        self.seconds_count = result.seconds_count;
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "match {} vs {} (event: {})",
            self.match_id, self.opponent_screen_name, self.event_id,
        )
    }
}

/// 업로드 페이로드
///
/// 각 필드는 해당 엔티티를 찾은 경우에만 존재하며, 없으면 직렬화에서 생략됩니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<Collection>,
    #[serde(rename = "deck", default, skip_serializing_if = "Option::is_none")]
    pub decks: Option<Vec<Deck>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<PlayerInventory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<RankInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<Match>>,
}

impl UploadPayload {
    /// 채워진 필드가 하나도 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.present_fields().is_empty()
    }

    /// 채워진 최상위 필드 이름 목록 (로그용)
    pub fn present_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.collection.is_some() {
            fields.push("collection");
        }
        if self.decks.is_some() {
            fields.push("deck");
        }
        if self.inventory.is_some() {
            fields.push("inventory");
        }
        if self.rank.is_some() {
            fields.push("rank");
        }
        if self.auth.is_some() {
            fields.push("auth");
        }
        if self.matches.is_some() {
            fields.push("matches");
        }
        fields
    }
}
