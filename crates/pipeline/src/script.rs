//! Narration prompt and script extraction.
//!
//! The vision model is asked to answer in a fixed format with the
//! narration script delimited by the `[原稿]` marker. Responses that
//! ignore the format are tolerated: without the marker, the whole
//! response text is the script.

use std::sync::OnceLock;

use regex::Regex;

/// Fixed prompt sent with every whiteboard photo.
///
/// Requests extraction of the four workshop keywords and a spoken-style
/// narration script of roughly 300–400 characters (about one minute of
/// speech), with the script segment delimited by `[原稿]`.
pub const NARRATION_PROMPT: &str = "\
このホワイトボードの画像を分析し、そこに書かれている内容を読み取ってください。
特に、感染症対応などの文脈で書かれている「疑う」「分ける」「守る」「つなぐ」の4つのキーワードと、それぞれの具体的な内容を正確に抽出してください。

その上で、医師会研修の講師が読み上げるための、全体で1分程度（約300〜400文字）の落ち着いた日本語のナレーション原稿を作成してください。

構成:
1. 導入（この図解が何を示しているか）
2. 4つのポイント（疑う・分ける・守る・つなぐ）の解説
3. まとめ

出力フォーマット:
---
[要約]
- 疑う: (内容)
- 分ける: (内容)
- 守る: (内容)
- つなぐ: (内容)

[原稿]
(ここに読み上げ原稿テキストのみを記述してください。見出しなどは含めず、話し言葉で書いてください)
---
";

/// Reading speed assumed for duration estimation (characters per minute
/// of calm Japanese narration).
const CHARS_PER_MINUTE: u32 = 350;

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[原稿\](.*?)(?:---|$)").expect("script marker regex"))
}

/// Extract the narration script segment from a vision response.
///
/// Looks for the `[原稿]` marker and returns the text up to the closing
/// `---` (or the end of the response). When the marker is absent the
/// whole response is the script -- a tolerated case, never an error.
pub fn extract_script(text: &str) -> &str {
    match script_re().captures(text) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(text).trim(),
        None => text.trim(),
    }
}

/// Approximate narration duration in seconds for a script.
///
/// Derived from character count at [`CHARS_PER_MINUTE`]; always at
/// least one second.
pub fn estimate_duration_secs(script: &str) -> u32 {
    let chars = script.chars().count() as u32;
    (chars * 60 / CHARS_PER_MINUTE).max(1)
}
