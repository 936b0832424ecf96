//! Prompt contract: the rule set given to the generation backend.
//!
//! The contract comes in two variants selected by the retry controller. The
//! strict variant is the base text followed by a forceful restatement of the
//! rules and of the constraints the previous attempt violated. The constants
//! below are the same ones the validator enforces.

use crate::domain::errors::DomainResult;
use crate::domain::models::{ContractVariant, Measurement, ReportInput, SelfReport};
use crate::services::numeric::format_delta;
use crate::services::report_validator::Violation;

/// Required report sections, in order.
pub const REQUIRED_HEADINGS: [&str; 5] = [
    "【本日のまとめ】",
    "【数値の変化】",
    "【主観・生活背景】",
    "【セルフケア（次回まで）】",
    "【次回来店の目安】",
];

/// Canonical next-visit phrase used by the contract and the fallback report.
pub const NEXT_VISIT_PHRASE: &str = "3〜6週間後（約1ヶ月〜1ヶ月半）";

/// Terms implying an in-person visit or booking; forbidden in the next action.
pub const BANNED_TERMS: [&str; 8] = [
    "来店",
    "予約",
    "施術",
    "サロン",
    "クリニック",
    "病院",
    "受診",
    "通院",
];

/// Duration or repetition units; the next action must contain one.
pub const UNIT_TOKENS: [&str; 5] = ["分", "秒", "回", "時間", "セット"];

/// Bounds on the next action, in characters after trimming.
pub const NEXT_ACTION_MIN_CHARS: usize = 40;
pub const NEXT_ACTION_MAX_CHARS: usize = 70;

/// Label under which the next action is appended to a persisted report.
pub const NEXT_ACTION_LABEL: &str = "次回までの1アクション";

const KNOWLEDGE: &str = "\
# 参考知識（断定せず傾向として扱うこと）
- RMSSD：副交感神経（リラックス）の働きの目安。上昇はリラックス方向の傾向。
- SDNN：自律神経全体の活動量・ゆとりの目安。
- 心拍数：低下はリラックス方向の傾向。
- RMSSDが上がった場合は「リラックスしやすい状態に近づいた傾向」、ほぼ変わらない場合は「安定して保たれている」、下がった場合は「緊張が残りやすい日だった可能性」と表現する。
- 主観スコアは sleep_quality は高いほど良い、stress と body_heaviness は低いほど良い。差分は常に after − before。";

const RULES: &str = "\
# 役割
あなたはリラクゼーションサロンのスタッフとして、施術後にお客様へお渡しする「施術後レポート」を書きます。

# 厳守ルール
1. DATA に含まれる数値だけを使うこと。存在しない数値・比較を作らない。値がない項目は「データ不足」とする。
2. subjective_after が DATA に無い場合、主観スコアの施術前後比較を書かない。
3. 医療的な診断・効果の断定・因果の断定をしない（「治る」「改善した」ではなく「〜の傾向」「〜しやすい」）。
4. 数値は半角数字で書き、【数値の変化】では少なくとも2つの異なる数値を引用する。
5. 見出しは次の5つをこの順番で、そのまま使うこと：
   【本日のまとめ】【数値の変化】【主観・生活背景】【セルフケア（次回まで）】【次回来店の目安】
6. 【次回来店の目安】には必ず「3〜6週間後（約1ヶ月〜1ヶ月半）」と書く。
7. やさしい丁寧語で、箇条書きと短い段落を使う。";

const NEXT_ACTION_RULES: &str = "\
# next_action（次回までの1アクション）のルール
- 40〜70文字の1文。改行しない。
- 自宅で一人でできる具体的な行動にする。
- 半角数字と単位（分・秒・回・時間・セットのいずれか）を必ず含める。
- 「来店」「予約」「施術」「サロン」「クリニック」「病院」「受診」「通院」は使わない。";

const OUTPUT_FORMAT: &str = "\
# 出力形式
次の2つのタグだけを出力すること。タグの外には何も書かない。JSONやコードブロックは使わない。
<report>
（レポート本文）
</report>
<next_action>
（次回までの1アクション）
</next_action>";

/// Renders system instructions and user content for a request.
#[derive(Debug, Clone, Copy)]
pub struct PromptContract {
    min_report_chars: usize,
}

impl PromptContract {
    pub fn new(min_report_chars: usize) -> Self {
        Self { min_report_chars }
    }

    /// The base contract shared by every attempt.
    pub fn base_instruction(&self) -> String {
        format!(
            "{RULES}\n8. レポート本文は{}文字以上にする。\n\n{NEXT_ACTION_RULES}\n\n{KNOWLEDGE}\n\n{OUTPUT_FORMAT}",
            self.min_report_chars
        )
    }

    /// System instruction for a contract variant.
    ///
    /// `violated` is only used by the strict variant.
    pub fn system_instruction(&self, variant: ContractVariant, violated: &[Violation]) -> String {
        match variant {
            ContractVariant::Base => self.base_instruction(),
            ContractVariant::Strict => {
                let mut text = self.base_instruction();
                text.push_str("\n\n# 再指示（最重要）\n前回の出力はルールを満たしていませんでした。");
                if !violated.is_empty() {
                    text.push_str("特に次の点を必ず直してください：\n");
                    for violation in violated {
                        text.push_str("- ");
                        text.push_str(&violation.restatement());
                        text.push('\n');
                    }
                } else {
                    text.push('\n');
                }
                text.push_str(&self.restated_rules());
                text
            }
        }
    }

    fn restated_rules(&self) -> String {
        format!(
            "\n# 改めて厳守すること\n\
             - 見出し5つ（{}）をすべて、この順番で含める。\n\
             - 本文は{}文字以上。\n\
             - 【次回来店の目安】に「{NEXT_VISIT_PHRASE}」と書く。\n\
             - 本文中に半角数字で2つ以上の異なる数値を引用する。\n\
             - next_action は{NEXT_ACTION_MIN_CHARS}〜{NEXT_ACTION_MAX_CHARS}文字・1行・半角数字と単位（{}）を含み、「{}」を含まない。\n\
             - <report> と <next_action> のタグで出力する。",
            REQUIRED_HEADINGS.join(""),
            self.min_report_chars,
            UNIT_TOKENS.join("・"),
            BANNED_TERMS.join("」「"),
        )
    }

    /// User content: the DATA document plus preformatted deltas.
    pub fn user_content(&self, input: &ReportInput) -> DomainResult<String> {
        let data = input.to_pretty_json()?;
        let today = &input.today;
        let metric = |f: fn(&Measurement) -> Option<f64>| {
            format_delta(today.before.as_ref().and_then(f), today.after.as_ref().and_then(f))
        };
        let score = |f: fn(&SelfReport) -> Option<u8>| {
            match &today.subjective_after {
                Some(after) => format_delta(
                    today.subjective_before.as_ref().and_then(f).map(f64::from),
                    f(after).map(f64::from),
                ),
                None => format_delta(None, None),
            }
        };

        Ok(format!(
            "以下の DATA だけを根拠にレポートを書いてください。\n\n\
             DATA:\n{data}\n\n\
             参考（整形済みの差分、after − before）:\n\
             - RMSSD: {}\n\
             - SDNN: {}\n\
             - 心拍数: {}\n\
             - 睡眠の質（主観）: {}\n\
             - ストレス（主観）: {}\n\
             - 体の重さ（主観）: {}\n",
            metric(|m| m.rmssd),
            metric(|m| m.sdnn),
            metric(|m| m.heart_rate),
            score(|s| s.sleep_quality),
            score(|s| s.stress),
            score(|s| s.body_heaviness),
        ))
    }
}
