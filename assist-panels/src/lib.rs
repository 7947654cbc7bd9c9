//! Panel extraction for comic scripts returned by the text model.
//!
//! The model is asked for a four panel script but its formatting is not
//! guaranteed, so extraction is line oriented and forgiving:
//!
//! ```text
//! **Panel 1:**
//! - **Scene:** A cat sits under a streetlight.
//! - **Cat:** "Where did everyone go?"
//! ```
//!
//! Each panel header starts an independent forward scan over *all* remaining
//! lines. The first scene line and the first dialogue line found win, even
//! when they sit past the next header.

use assist_utils::{strip_emphasis, strip_wrapping_quotes};
use regex::Regex;
use std::iter::FusedIterator;
use std::sync::LazyLock;
use thiserror::Error;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:#{1,6}\s*)?(?:\*\*)?\s*panel\s*\d+\s*:\s*(?:\*\*)?").expect("valid regex")
});

static SCENE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[-•]\s*|\*\s+)?(?:\*\*)?\s*scene(?:\s+description)?\s*(?:\*\*)?\s*:\s*(?:\*\*)?(.*?)(?:\*\*)?\s*$",
    )
    .expect("valid regex")
});

static BOLD_DIALOGUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-•]\s*|\*\s+)?\*\*([^*]+?)(?::\s*\*\*|\*\*\s*:)\s*(.+)$")
        .expect("valid regex")
});

static LOOSE_DIALOGUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-•]\s*|\*\s+)?([^:：]+?)\s*[:：]\s*(.+)$").expect("valid regex")
});

const DIALOGUE_LABELS: &[&str] = &["dialogue", "dialog"];

/// A comic panel recovered from the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRecord {
    /// 1-based position among the panels that produced a scene.
    pub index: usize,
    pub scene: String,
    pub dialogue: Option<String>,
}

/// A panel header for which no usable scene line could be found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no scene description found for `{header}` (line {line})")]
pub struct MissingScene {
    pub header: String,
    /// 1-based line number of the header.
    pub line: usize,
}

/// Lazily walks the script, yielding one item per panel header.
#[derive(Debug, Clone)]
pub struct Panels<'a> {
    lines: Vec<&'a str>,
    cursor: usize,
    next_index: usize,
}

pub fn parse_panels(text: &str) -> Panels<'_> {
    Panels {
        lines: text.lines().collect(),
        cursor: 0,
        next_index: 1,
    }
}

/// Valid panels only; headers without a scene are dropped.
pub fn panel_records(text: &str) -> impl Iterator<Item = PanelRecord> + '_ {
    parse_panels(text).filter_map(Result::ok)
}

impl Iterator for Panels<'_> {
    type Item = Result<PanelRecord, MissingScene>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.lines.len() {
            let position = self.cursor;
            self.cursor += 1;

            let line = self.lines[position];
            if !is_panel_header(line) {
                continue;
            }

            let fields = scan_fields(&self.lines[position + 1..]);
            let item = match fields.scene {
                Some(scene) => {
                    let index = self.next_index;
                    self.next_index += 1;
                    Ok(PanelRecord {
                        index,
                        scene,
                        dialogue: fields.dialogue,
                    })
                }
                None => Err(MissingScene {
                    header: strip_emphasis(line).to_string(),
                    line: position + 1,
                }),
            };
            return Some(item);
        }

        None
    }
}

impl FusedIterator for Panels<'_> {}

pub fn is_panel_header(line: &str) -> bool {
    HEADER_RE.is_match(line)
}

#[derive(Debug, Default)]
struct PanelFields {
    scene: Option<String>,
    dialogue: Option<String>,
}

/// Picks the first scene and the first dialogue line after a header.
///
/// Header and scene lines are never taken as dialogue, even though the loose
/// `speaker: text` pattern would match them.
fn scan_fields(lines: &[&str]) -> PanelFields {
    let mut fields = PanelFields::default();

    for line in lines {
        if fields.scene.is_some() && fields.dialogue.is_some() {
            break;
        }

        if is_panel_header(line) {
            continue;
        }

        if let Some(captures) = SCENE_RE.captures(line) {
            if fields.scene.is_none() {
                fields.scene = captures
                    .get(1)
                    .map(|text| strip_emphasis(text.as_str()))
                    .filter(|text| !text.is_empty())
                    .map(str::to_string);
            }
            continue;
        }

        if fields.dialogue.is_none() {
            fields.dialogue = dialogue_text(line);
        }
    }

    fields
}

/// Extracts the spoken text from a `Speaker: text` style line.
pub fn dialogue_text(line: &str) -> Option<String> {
    let (speaker, text) = split_dialogue(line)?;

    // `**Dialogue:** Hero: "Hi"` names the field rather than the speaker.
    let text = if DIALOGUE_LABELS.contains(&speaker.to_ascii_lowercase().as_str()) {
        split_dialogue(text).map_or(text, |(_, inner)| inner)
    } else {
        text
    };

    let cleaned = strip_wrapping_quotes(strip_emphasis(text));
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn split_dialogue(line: &str) -> Option<(&str, &str)> {
    let captures = BOLD_DIALOGUE_RE
        .captures(line)
        .or_else(|| LOOSE_DIALOGUE_RE.captures(line))?;
    let speaker = captures.get(1)?.as_str();
    let text = captures.get(2)?.as_str();
    Some((strip_emphasis(speaker), text))
}
