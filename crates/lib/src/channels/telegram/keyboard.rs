//! Reply keyboards built from quick replies.

use serde::{Deserialize, Serialize};

/// `reply_markup` value: a one-row custom keyboard, or a directive removing any shown keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Keyboard {
        resize_keyboard: bool,
        one_time_keyboard: bool,
        keyboard: Vec<Vec<KeyboardButton>>,
    },
    Remove { remove_keyboard: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardButton {
    pub text: String,
}

impl ReplyMarkup {
    pub fn remove() -> Self {
        Self::Remove {
            remove_keyboard: true,
        }
    }

    /// JSON form sent as the `reply_markup` form field.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"remove_keyboard":true}"#.to_string())
    }
}

/// One key per quick reply, in order, on a single row. No quick replies removes the keyboard.
pub fn build(quick_replies: &[String]) -> ReplyMarkup {
    if quick_replies.is_empty() {
        return ReplyMarkup::remove();
    }
    let row = quick_replies
        .iter()
        .map(|qr| KeyboardButton { text: qr.clone() })
        .collect();
    ReplyMarkup::Keyboard {
        resize_keyboard: true,
        one_time_keyboard: true,
        keyboard: vec![row],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builds_remove_directive() {
        let markup = build(&[]);
        assert_eq!(markup.to_json(), r#"{"remove_keyboard":true}"#);
        let parsed: ReplyMarkup = serde_json::from_str(&markup.to_json()).unwrap();
        assert_eq!(parsed, ReplyMarkup::remove());
    }

    #[test]
    fn options_become_one_row_in_order() {
        let markup = build(&["Yes".to_string(), "No".to_string(), "Yes".to_string()]);
        assert_eq!(
            markup.to_json(),
            r#"{"resize_keyboard":true,"one_time_keyboard":true,"keyboard":[[{"text":"Yes"},{"text":"No"},{"text":"Yes"}]]}"#
        );
        let parsed: ReplyMarkup = serde_json::from_str(&markup.to_json()).unwrap();
        assert_eq!(parsed, markup);
    }
}
