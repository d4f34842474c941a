//! 전투 중계 코멘터리.
//!
//! 정산이 끝난 전투의 감사 페이로드를 사람이 읽을 수 있는 중계 문장으로
//! 바꾼다. 로케일별 Fluent 번들(en-US, ko-KR 내장)에서 메시지를 찾고,
//! 같은 판정이라도 시드 기반 난수로 문구 변형을 골라 단조로움을 줄인다.
//! 번들이 없거나 메시지 렌더링이 실패하면 꾸밈 없는 영어 문장으로
//! 대체하며, 중계 때문에 정산 흐름이 멈추는 일은 없다.

use std::collections::HashMap;

use fluent::{FluentArgs, FluentBundle, FluentResource, FluentValue};
use fluent_langneg::{negotiate_languages, NegotiationStrategy};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use unic_langid::LanguageIdentifier;

use crate::error::CoreError;
use crate::models::{BattleAuditPayload, Verdict};

// ============================================================================
// 내장 로케일 리소스
// ============================================================================

/// 해설자가 기본으로 쓰는 로케일.
pub const DEFAULT_LOCALE: &str = "en-US";

const EN_US_FTL: &str = include_str!("../../../../data/locales/en-US.ftl");
const KO_KR_FTL: &str = include_str!("../../../../data/locales/ko-KR.ftl");

/// `verdict-win-N` 변형 개수. FTL 파일과 함께 갱신한다.
const WIN_VARIANTS: u32 = 3;
/// `verdict-draw-N` 변형 개수. FTL 파일과 함께 갱신한다.
const DRAW_VARIANTS: u32 = 2;

// ============================================================================
// 전투 해설자
// ============================================================================

/// 정산 페이로드를 로케일별 중계 문장으로 바꾸는 해설자.
///
/// 변형 선택에 [`ChaCha8Rng`]를 쓰므로 같은 시드에 같은 입력이면 항상
/// 같은 문장이 나온다. 데모 러너가 사이클 시드를 그대로 넘겨 재현
/// 가능한 출력을 만든다.
pub struct BattleCommentator {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
    current_locale: String,
    fallback_locale: String,
    rng: ChaCha8Rng,
}

impl BattleCommentator {
    /// 내장 로케일(en-US, ko-KR)을 모두 실은 해설자를 만든다.
    ///
    /// # Panics
    ///
    /// 내장 FTL 리소스는 컴파일 타임에 포함되므로 파싱 실패는 빌드
    /// 자산의 버그다. 이 경우 패닉한다.
    pub fn new(seed: u64) -> Self {
        let mut commentator = Self::empty(seed);
        commentator
            .load_locale("en-US", EN_US_FTL)
            .expect("Failed to parse embedded en-US commentary");
        commentator
            .load_locale("ko-KR", KO_KR_FTL)
            .expect("Failed to parse embedded ko-KR commentary");
        commentator
    }

    /// 번들 없이 시작한다. 모든 문장이 영어 기본 문구로만 나온다.
    pub fn empty(seed: u64) -> Self {
        Self {
            bundles: HashMap::new(),
            current_locale: DEFAULT_LOCALE.to_string(),
            fallback_locale: DEFAULT_LOCALE.to_string(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// FTL 소스를 파싱해 로케일 번들로 등록한다. 같은 로케일을 다시
    /// 등록하면 기존 번들을 통째로 교체한다.
    pub fn load_locale(&mut self, locale: &str, ftl_source: &str) -> Result<(), CoreError> {
        let resource = FluentResource::try_new(ftl_source.to_string()).map_err(|_| {
            CoreError::ParseError(format!("Failed to parse FTL for locale {}", locale))
        })?;
        let lang_id: LanguageIdentifier = locale.parse().map_err(|_| {
            CoreError::ParseError(format!("Invalid locale identifier: {}", locale))
        })?;
        let mut bundle = FluentBundle::new(vec![lang_id]);
        // 터미널 출력이 그대로 읽히도록 BiDi 격리 문자는 끼워 넣지 않는다.
        bundle.set_use_isolating(false);
        bundle.add_resource(resource).map_err(|_| {
            CoreError::ParseError(format!("Failed to add FTL resource for locale {}", locale))
        })?;
        self.bundles.insert(locale.to_string(), bundle);
        Ok(())
    }

    /// 적재된 로케일로 전환한다. 없는 로케일이면 현재 설정을 그대로 둔다.
    pub fn set_locale(&mut self, locale: &str) -> Result<(), CoreError> {
        if self.bundles.contains_key(locale) {
            self.current_locale = locale.to_string();
            Ok(())
        } else {
            Err(CoreError::NotFound(format!("Locale not loaded: {}", locale)))
        }
    }

    pub fn current_locale(&self) -> &str {
        &self.current_locale
    }

    /// 적재된 로케일 목록. 정렬해서 돌려준다.
    pub fn available_locales(&self) -> Vec<String> {
        let mut locales: Vec<String> = self.bundles.keys().cloned().collect();
        locales.sort();
        locales
    }

    /// 요청 로케일 목록과 적재된 번들을 협상해 가장 맞는 로케일을 고른다.
    ///
    /// `"ko"`처럼 지역 없는 요청도 `ko-KR` 번들로 이어진다. 아무것도
    /// 맞지 않으면 폴백 로케일을 돌려준다.
    pub fn negotiate_locale(&self, requested: &[String]) -> String {
        let requested_ids: Vec<LanguageIdentifier> =
            requested.iter().filter_map(|locale| locale.parse().ok()).collect();
        let available_ids: Vec<LanguageIdentifier> =
            self.bundles.keys().filter_map(|locale| locale.parse().ok()).collect();
        let default: LanguageIdentifier = match self.fallback_locale.parse() {
            Ok(id) => id,
            Err(_) => return self.fallback_locale.clone(),
        };
        negotiate_languages(
            &requested_ids,
            &available_ids,
            Some(&default),
            NegotiationStrategy::Filtering,
        )
        .first()
        .map(|id| id.to_string())
        .unwrap_or_else(|| self.fallback_locale.clone())
    }

    // ------------------------------------------------------------------
    // 중계 문장 생성
    // ------------------------------------------------------------------

    /// 정산 페이로드 하나를 중계 문장 묶음으로 바꾼다.
    ///
    /// 판정 한 줄이 먼저 나오고, 파괴와 교대 이벤트가 한 줄씩, 마지막에
    /// 수익 지급 요약이 붙는다. 부전승은 판정 한 줄뿐이다. 이름 표에
    /// 없는 로봇은 `Robot {id}` 자리표시로 부른다.
    pub fn narrate(
        &mut self,
        payload: &BattleAuditPayload,
        names: &HashMap<u64, String>,
    ) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(self.verdict_line(payload, names));

        for record in &payload.participants {
            if record.destroyed {
                let robot = display_name(names, record.robot_id);
                let mut args = FluentArgs::new();
                args.set("robot", robot.clone());
                lines.push(self.format("destruction-line", Some(&args), || {
                    format!("{} is destroyed.", robot)
                }));
            }
        }
        for record in &payload.participants {
            if record.tagged_out {
                let robot = display_name(names, record.robot_id);
                let mut args = FluentArgs::new();
                args.set("robot", robot.clone());
                lines.push(self.format("tag-out-line", Some(&args), || {
                    format!("{} tags out.", robot)
                }));
            }
        }

        if !payload.revenue.is_empty() {
            let total: i64 =
                payload.revenue.iter().map(|record| record.breakdown.total_revenue).sum();
            let rows = payload.revenue.len();
            let mut args = FluentArgs::new();
            args.set("amount", FluentValue::from(total));
            args.set("rows", FluentValue::from(rows as i64));
            lines.push(self.format("payout-line", Some(&args), || {
                format!("Paid {} credits across {} ledger rows.", total, rows)
            }));
        }
        lines
    }

    fn verdict_line(
        &mut self,
        payload: &BattleAuditPayload,
        names: &HashMap<u64, String>,
    ) -> String {
        let outcome = &payload.outcome;
        if outcome.is_bye {
            let robot = display_name(names, outcome.side_a.deciding_robot_id);
            let mut args = FluentArgs::new();
            args.set("robot", robot.clone());
            return self.format("verdict-bye", Some(&args), || {
                format!("{} advances on a bye.", robot)
            });
        }
        match outcome.verdict {
            Verdict::Draw => {
                let key = self.pick_variant("verdict-draw", DRAW_VARIANTS);
                self.format(&key, None, || "The battle ends in a draw.".to_string())
            }
            Verdict::Win(winning_side) => {
                let winner_name = outcome
                    .side(winning_side)
                    .map(|side| display_name(names, side.deciding_robot_id))
                    .unwrap_or_else(|| "Unknown".to_string());
                let loser_name = outcome
                    .side(winning_side.opponent())
                    .map(|side| display_name(names, side.deciding_robot_id))
                    .unwrap_or_else(|| "Unknown".to_string());
                let key = self.pick_variant("verdict-win", WIN_VARIANTS);
                let mut args = FluentArgs::new();
                args.set("winner", winner_name.clone());
                args.set("loser", loser_name.clone());
                self.format(&key, Some(&args), || {
                    format!("{} defeats {}.", winner_name, loser_name)
                })
            }
        }
    }

    /// 같은 판정이 반복돼도 문구가 겹치지 않게 변형 번호를 난수로 고른다.
    fn pick_variant(&mut self, base: &str, variants: u32) -> String {
        format!("{}-{}", base, self.rng.gen_range(1..=variants))
    }

    /// 현재 로케일, 폴백 로케일 순으로 메시지를 찾고, 둘 다 실패하면
    /// 주어진 영어 기본 문장을 돌려준다.
    fn format<F>(&self, key: &str, args: Option<&FluentArgs>, fallback: F) -> String
    where
        F: FnOnce() -> String,
    {
        if let Some(line) = self.format_with_bundle(&self.current_locale, key, args) {
            return line;
        }
        if self.fallback_locale != self.current_locale {
            if let Some(line) = self.format_with_bundle(&self.fallback_locale, key, args) {
                return line;
            }
        }
        fallback()
    }

    fn format_with_bundle(
        &self,
        locale: &str,
        key: &str,
        args: Option<&FluentArgs>,
    ) -> Option<String> {
        let bundle = self.bundles.get(locale)?;
        let message = bundle.get_message(key)?;
        let pattern = message.value()?;
        let mut errors = Vec::new();
        let formatted = bundle.format_pattern(pattern, args, &mut errors);
        if errors.is_empty() {
            Some(formatted.to_string())
        } else {
            None
        }
    }
}

/// 이름 표에 없는 로봇은 식별자 기반 자리표시 이름으로 부른다.
fn display_name(names: &HashMap<u64, String>, robot_id: u64) -> String {
    names.get(&robot_id).cloned().unwrap_or_else(|| format!("Robot {}", robot_id))
}
