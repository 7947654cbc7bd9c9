//! Prompt templates sent to the text completion endpoint.

pub const SUMMARIZE_PREFIX: &str = "Summarize this:\n\n";
pub const EXPLAIN_PREFIX: &str = "Explain the following code step by step:\n\n";
pub const COMIC_PREFIX: &str = "You are a comic strip writer. Turn the following story into a 4-panel comic. \
For each panel, provide a short scene description and the character dialogue.\n\nStory:\n";
pub const PANEL_IMAGE_STYLE: &str = "comic book style, clean lines, no text";

/// The instruction wrapped around the input file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    Summarize,
    Explain,
    Translate { lang: String },
    Comic,
}

impl Template {
    pub fn render(&self, text: &str) -> String {
        match self {
            Template::Summarize => summarize(text),
            Template::Explain => explain(text),
            Template::Translate { lang } => translate(text, lang),
            Template::Comic => comic(text),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Template::Summarize => "summarize",
            Template::Explain => "explain",
            Template::Translate { .. } => "translate",
            Template::Comic => "comic",
        }
    }
}

pub fn summarize(text: &str) -> String {
    format!("{SUMMARIZE_PREFIX}{text}")
}

pub fn explain(text: &str) -> String {
    format!("{EXPLAIN_PREFIX}{text}")
}

pub fn translate(text: &str, lang: &str) -> String {
    format!("Translate this to {lang}:\n\n{text}")
}

pub fn comic(text: &str) -> String {
    format!("{COMIC_PREFIX}{text}")
}

/// Builds the image generation prompt for a single comic panel.
pub fn panel_image(scene: &str) -> String {
    format!("{scene}, {PANEL_IMAGE_STYLE}")
}

#[cfg(test)]
mod tests;
