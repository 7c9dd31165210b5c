use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::preprocess::preprocess_text;

/// The intents the recognizer can report. Declaration order is also the scan
/// order, which decides ties.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ViewMenu,
    AskPrice,
    OrderInfo,
    Greeting,
    ThankYou,
    AskBot,
    ConfirmYes,
    ConfirmNo,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::ViewMenu => "view_menu",
            Intent::AskPrice => "ask_price",
            Intent::OrderInfo => "order_info",
            Intent::Greeting => "greeting",
            Intent::ThankYou => "thank_you",
            Intent::AskBot => "ask_bot",
            Intent::ConfirmYes => "confirm_yes",
            Intent::ConfirmNo => "confirm_no",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Keyword sets for the built-in recognizer
const VIEW_MENU: &[&str] = &[
    "menu", "food menu", "drink menu", "list of food", "list of drinks",
    "what do you have", "what's available", "show menu", "display menu", "menu please",
    "today's menu", "what's on the menu", "show me the menu", "can I see the menu",
    "can I see menu", "show me menu", "what food do you have", "what drinks do you have",
    "what items are on the menu", "what menu items do you have", "tell me the menu",
    "display menu list", "see menu list", "what menu items",
];
const ASK_PRICE: &[&str] = &[
    "price", "how much", "cost", "how much is", "how much does", "what's the price",
    "how much money", "how much is it", "how much does it cost", "how many rupiah",
    "rate", "fee", "how much is the price", "what does it cost",
];
const ORDER_INFO: &[&str] = &[
    "order", "buy", "purchase", "how to order", "how do I order", "want to order", "want to buy",
    "I want", "can order", "can buy", "order please", "order for me", "can purchase",
    "order now", "booking", "I want to", "let's order", "can book", "I want to order please",
    "I want to buy please", "I want to order", "I want to purchase", "order for me please",
];
const GREETING: &[&str] = &[
    "hello", "hi", "hey", "good morning", "good afternoon", "good evening", "good night",
    "morning", "afternoon", "evening", "night", "heyy", "heyyo", "hello hello", "hi hi",
    "hey hey",
];
const THANK_YOU: &[&str] = &[
    "thanks", "thank you", "thx", "ty", "thanks a lot", "thank you very much",
    "thank you so much", "much appreciated", "grateful", "thank u", "tq", "tqvm",
    "thx a lot", "thanks so much", "thank you lots", "tyvm", "many thanks", "thanks again",
];
const ASK_BOT: &[&str] = &[
    "who are you", "what are you", "what bot is this", "what can you do",
    "what kind of bot", "what's your purpose", "what can this bot do", "introduce yourself",
    "what's your function",
];
const CONFIRM_YES: &[&str] = &[
    "yes", "yeah", "right", "correct", "ok", "okay", "alright", "sure", "agree", "continue",
    "want to", "yup", "yep", "absolutely", "definitely", "alright then", "can", "lets go",
    "go ahead", "let's do it", "come on", "let's go", "okay ready", "yeah sure", "okay then",
    "okay let's go", "okay go ahead", "okay let's do it", "okay come on", "can we",
    "sure let's go", "yay",
];
const CONFIRM_NO: &[&str] = &[
    "no", "not", "don't", "nope", "not really", "cancel", "not doing it", "changed my mind",
    "not going to", "never mind", "skip", "don't bother", "no thanks", "maybe later",
    "not now", "later", "not happening", "not right now", "skip for now",
    "maybe next time", "not today", "just skip", "some other time", "don't want to",
    "cancel that",
];

/// A named keyword list, loadable from JSON like `{"intent": "greeting", "keywords": [...]}`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct KeywordSet {
    pub intent: Intent,
    pub keywords: Vec<String>,
}

/// Result of scoring a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognizedIntent {
    /// `None` when no keyword hit at all.
    pub intent: Option<Intent>,
    pub score: u32,
}

impl RecognizedIntent {
    pub fn label(&self) -> &'static str {
        self.intent.map(Intent::as_str).unwrap_or("general")
    }
}

#[derive(Debug, Clone)]
struct CompiledKeyword {
    text: String,
    boundary: Regex,
}

#[derive(Debug, Clone)]
struct CompiledIntent {
    intent: Intent,
    keywords: Vec<CompiledKeyword>,
}

/// Keyword scorer: a whole-word hit is worth 2 points, a bare substring hit 1.
#[derive(Debug, Clone)]
pub struct IntentRecognizer {
    intents: Vec<CompiledIntent>,
}

impl Default for IntentRecognizer {
    fn default() -> Self {
        let sets = [
            (Intent::ViewMenu, VIEW_MENU),
            (Intent::AskPrice, ASK_PRICE),
            (Intent::OrderInfo, ORDER_INFO),
            (Intent::Greeting, GREETING),
            (Intent::ThankYou, THANK_YOU),
            (Intent::AskBot, ASK_BOT),
            (Intent::ConfirmYes, CONFIRM_YES),
            (Intent::ConfirmNo, CONFIRM_NO),
        ]
        .into_iter()
        .map(|(intent, words)| KeywordSet {
            intent,
            keywords: words.iter().map(|w| w.to_string()).collect(),
        })
        .collect();
        Self::new(sets)
    }
}

impl IntentRecognizer {
    /// Builds a recognizer from keyword sets; their order is the tie-break order.
    ///
    /// Keywords are normalized the same way as incoming text, and repeats within
    /// one set are dropped.
    pub fn new(sets: Vec<KeywordSet>) -> Self {
        let intents = sets
            .into_iter()
            .map(|set| {
                let mut seen: Vec<String> = Vec::new();
                for keyword in &set.keywords {
                    let normalized = preprocess_text(keyword);
                    if !normalized.is_empty() && !seen.contains(&normalized) {
                        seen.push(normalized);
                    }
                }
                let keywords = seen
                    .into_iter()
                    .filter_map(|text| {
                        let pattern = format!(r"\b{}\b", regex::escape(&text));
                        match Regex::new(&pattern) {
                            Ok(boundary) => Some(CompiledKeyword { text, boundary }),
                            Err(e) => {
                                log::warn!("Skipping keyword '{}' for {}: {}", text, set.intent, e);
                                None
                            }
                        }
                    })
                    .collect();
                CompiledIntent {
                    intent: set.intent,
                    keywords,
                }
            })
            .collect();
        Self { intents }
    }

    /// Loads keyword sets from a JSON file holding a list of [`KeywordSet`].
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read intents file {:?}", path_ref))?;
        let sets: Vec<KeywordSet> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse intents file {:?}", path_ref))?;
        Ok(Self::new(sets))
    }

    /// Picks the intent with the strictly highest score; on equal scores the
    /// one scanned first keeps the lead.
    ///
    /// Each distinct keyword counts once, so a word repeated in a keyword list
    /// adds no weight. Ties are therefore common: "hey can I order" scores 2
    /// for order_info, greeting and confirm_yes, and order_info wins by scan
    /// order.
    pub fn recognize(&self, text: &str) -> RecognizedIntent {
        let processed_text = preprocess_text(text);
        if processed_text.is_empty() {
            return RecognizedIntent { intent: None, score: 0 };
        }

        let mut best_match: Option<(Intent, u32)> = None;
        for compiled in &self.intents {
            let score: u32 = compiled
                .keywords
                .iter()
                .map(|k| {
                    if k.boundary.is_match(&processed_text) {
                        2
                    } else if processed_text.contains(k.text.as_str()) {
                        1
                    } else {
                        0
                    }
                })
                .sum();

            if score > 0 {
                match best_match {
                    Some((_, best_score)) if score <= best_score => {}
                    _ => best_match = Some((compiled.intent, score)),
                }
            }
        }

        match best_match {
            Some((intent, score)) => RecognizedIntent {
                intent: Some(intent),
                score,
            },
            None => RecognizedIntent { intent: None, score: 0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_with_order_ties_to_order_info() {
        let recognizer = IntentRecognizer::default();
        let result = recognizer.recognize("hey can I order");
        assert_eq!(result.intent, Some(Intent::OrderInfo));
        assert_eq!(result.score, 2);
    }

    #[test]
    fn test_view_menu() {
        let recognizer = IntentRecognizer::default();
        let result = recognizer.recognize("show me the menu");
        assert_eq!(result.intent, Some(Intent::ViewMenu));
        assert!(result.score >= 2);
    }

    #[test]
    fn test_no_hit() {
        let recognizer = IntentRecognizer::default();
        assert_eq!(
            recognizer.recognize("xyzzy quux"),
            RecognizedIntent { intent: None, score: 0 }
        );
        assert_eq!(recognizer.recognize("").label(), "general");
    }

    #[test]
    fn test_order_beats_loose_substring() {
        // "coffee" contains "fee" which is a loose ask_price hit.
        let recognizer = IntentRecognizer::default();
        let result = recognizer.recognize("order iced coffee");
        assert_eq!(result.intent, Some(Intent::OrderInfo));
    }

    #[test]
    fn test_single_substring_hit_is_enough() {
        let recognizer = IntentRecognizer::new(vec![KeywordSet {
            intent: Intent::AskPrice,
            keywords: vec!["fee".into()],
        }]);
        let result = recognizer.recognize("toffee");
        assert_eq!(result.intent, Some(Intent::AskPrice));
        assert_eq!(result.score, 1);
    }

    #[test]
    fn test_tie_goes_to_first_set() {
        let recognizer = IntentRecognizer::new(vec![
            KeywordSet {
                intent: Intent::Greeting,
                keywords: vec!["yo".into()],
            },
            KeywordSet {
                intent: Intent::ConfirmYes,
                keywords: vec!["yo".into()],
            },
        ]);
        let result = recognizer.recognize("yo");
        assert_eq!(result.intent, Some(Intent::Greeting));
        assert_eq!(result.score, 2);
    }

    #[test]
    fn test_keywords_are_normalized() {
        let recognizer = IntentRecognizer::default();
        let result = recognizer.recognize("What's the price?");
        assert_eq!(result.intent, Some(Intent::AskPrice));
    }

    #[test]
    fn test_thanks() {
        let recognizer = IntentRecognizer::default();
        assert_eq!(
            recognizer.recognize("thank you so much").intent,
            Some(Intent::ThankYou)
        );
    }

    #[test]
    fn test_keyword_sets_from_json() {
        let json = r#"[{"intent": "greeting", "keywords": ["aloha"]}]"#;
        let sets: Vec<KeywordSet> = serde_json::from_str(json).unwrap();
        let recognizer = IntentRecognizer::new(sets);
        assert_eq!(recognizer.recognize("Aloha!").intent, Some(Intent::Greeting));
        assert_eq!(recognizer.recognize("show me the menu").intent, None);
    }
}
