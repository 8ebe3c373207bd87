//! Conversion between the HTML stored in description fields and the
//! styled text runs written to spreadsheet cells.
//!
//! Only inline emphasis survives the conversion: `<b>`/`<strong>`,
//! `<i>`/`<em>` and `<u>`. Line breaks (`<br>`) and block ends (`</p>`,
//! `</div>`, `</li>`) become `\n`. Every other tag is dropped and its text
//! kept.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl TextStyle {
    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.underline
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub style: TextStyle,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

fn tag_regex() -> Option<&'static Regex> {
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<\s*(/?)\s*([a-zA-Z][a-zA-Z0-9]*)[^>]*>").ok())
        .as_ref()
}

#[derive(Default)]
struct StyleDepth {
    bold: usize,
    italic: usize,
    underline: usize,
}

impl StyleDepth {
    fn current(&self) -> TextStyle {
        TextStyle {
            bold: self.bold > 0,
            italic: self.italic > 0,
            underline: self.underline > 0,
        }
    }

    fn counter(&mut self, tag: &str) -> Option<&mut usize> {
        match tag {
            "b" | "strong" => Some(&mut self.bold),
            "i" | "em" => Some(&mut self.italic),
            "u" | "ins" => Some(&mut self.underline),
            _ => None,
        }
    }
}

/// Split an HTML fragment into styled runs. Adjacent runs with the same
/// style are merged and trailing line breaks are trimmed.
pub fn html_to_runs(html: &str) -> Vec<TextRun> {
    let Some(tags) = tag_regex() else {
        return vec![TextRun::plain(decode_entities(html))];
    };

    let mut runs: Vec<TextRun> = Vec::new();
    let mut depth = StyleDepth::default();
    let mut cursor = 0;

    for caps in tags.captures_iter(html) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        push_text(&mut runs, &decode_entities(&html[cursor..whole.start()]), depth.current());
        cursor = whole.end();

        let closing = caps.get(1).map_or(false, |m| !m.as_str().is_empty());
        let tag = name.as_str().to_ascii_lowercase();

        if tag == "br" {
            push_text(&mut runs, "\n", depth.current());
            continue;
        }

        if closing && matches!(tag.as_str(), "p" | "div" | "li") {
            push_text(&mut runs, "\n", depth.current());
            continue;
        }

        if let Some(counter) = depth.counter(&tag) {
            if closing {
                *counter = counter.saturating_sub(1);
            } else {
                *counter += 1;
            }
        }
    }
    push_text(&mut runs, &decode_entities(&html[cursor..]), depth.current());

    while let Some(last) = runs.last_mut() {
        let trimmed_len = last.text.trim_end_matches(['\n', '\r']).len();
        if trimmed_len == 0 {
            runs.pop();
        } else {
            last.text.truncate(trimmed_len);
            break;
        }
    }

    runs
}

pub(crate) fn push_text(runs: &mut Vec<TextRun>, text: &str, style: TextStyle) {
    if text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => runs.push(TextRun::styled(text, style)),
    }
}

/// Render runs back into the HTML form stored on description fields.
pub fn runs_to_html(runs: &[TextRun]) -> String {
    let mut html = String::new();
    for run in runs {
        let mut fragment = escape_html(&run.text).replace('\n', "<br>");
        if run.style.underline {
            fragment = format!("<u>{}</u>", fragment);
        }
        if run.style.italic {
            fragment = format!("<em>{}</em>", fragment);
        }
        if run.style.bold {
            fragment = format!("<strong>{}</strong>", fragment);
        }
        html.push_str(&fragment);
    }
    html
}

/// Escape plain cell text and keep its line breaks.
pub fn plain_text_to_html(text: &str) -> String {
    escape_html(&text.replace("\r\n", "\n")).replace('\n', "<br>")
}

/// True when the value contains at least one tag.
pub fn looks_like_html(value: &str) -> bool {
    tag_regex().map_or(false, |tags| tags.is_match(value))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> TextStyle {
        TextStyle {
            bold: true,
            ..TextStyle::default()
        }
    }

    #[test]
    fn test_html_to_runs_splits_on_emphasis() {
        let runs = html_to_runs("<p>Rate the <strong>likelihood</strong> of loss</p>");
        assert_eq!(
            runs,
            vec![
                TextRun::plain("Rate the "),
                TextRun::styled("likelihood", bold()),
                TextRun::plain(" of loss"),
            ]
        );
    }

    #[test]
    fn test_nested_styles_and_breaks() {
        let runs = html_to_runs("<b>Key <i>point</i></b><br/>next");
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0], TextRun::styled("Key ", bold()));
        assert!(runs[1].style.bold && runs[1].style.italic);
        assert_eq!(runs[2], TextRun::plain("\nnext"));
    }

    #[test]
    fn test_entities_and_unknown_tags() {
        assert_eq!(
            html_to_runs("<span class=\"x\">R&amp;D &lt;core&gt;</span>"),
            vec![TextRun::plain("R&D <core>")]
        );
    }

    #[test]
    fn test_paragraphs_become_lines() {
        assert_eq!(
            html_to_runs("<p>one</p><p>two</p>"),
            vec![TextRun::plain("one\ntwo")]
        );
    }

    #[test]
    fn test_runs_to_html_roundtrip() {
        let html = "Plain <strong>bold</strong> <em><u>both</u></em>";
        let runs = html_to_runs(html);
        assert_eq!(runs_to_html(&runs), html);
    }

    #[test]
    fn test_plain_text_to_html_escapes() {
        assert_eq!(
            plain_text_to_html("a < b\r\nc & d"),
            "a &lt; b<br>c &amp; d"
        );
        assert!(!looks_like_html("a < b"));
        assert!(looks_like_html("<p>a</p>"));
    }
}
