use super::*;

#[test]
fn summarize_prefixes_contents_verbatim() {
    let contents = "Line one.\n\n  Line two with trailing space \n";
    assert_eq!(summarize(contents), format!("Summarize this:\n\n{contents}"));
}

#[test]
fn explain_prefixes_code() {
    let prompt = explain("fn main() {}");
    assert_eq!(
        prompt,
        "Explain the following code step by step:\n\nfn main() {}"
    );
}

#[test]
fn translate_names_target_language() {
    let prompt = translate("Bonjour", "English");
    assert_eq!(prompt, "Translate this to English:\n\nBonjour");
}

#[test]
fn comic_requests_four_panels_with_story() {
    let prompt = comic("A cat finds a hat.");
    assert!(prompt.starts_with("You are a comic strip writer."));
    assert!(prompt.contains("4-panel comic"));
    assert!(prompt.ends_with("\n\nStory:\nA cat finds a hat."));
}

#[test]
fn template_render_dispatches_to_functions() {
    let lang = Template::Translate {
        lang: "German".to_string(),
    };
    assert_eq!(lang.render("Hi"), translate("Hi", "German"));
    assert_eq!(Template::Summarize.render("x"), summarize("x"));
    assert_eq!(Template::Explain.render("x"), explain("x"));
    assert_eq!(Template::Comic.render("x"), comic("x"));
    assert_eq!(lang.name(), "translate");
}

#[test]
fn panel_image_appends_comic_style() {
    assert_eq!(
        panel_image("A knight on a hill"),
        "A knight on a hill, comic book style, clean lines, no text"
    );
}
