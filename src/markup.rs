//! SSML request bodies.
//!
//! Text is inserted verbatim so callers can embed SSML elements such as
//! `<bookmark mark="A"/>` directly in their narration.

/// Collapse every whitespace run to a single space and trim the ends.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render the SSML document for `text` spoken by `voice`.
///
/// When `style` is set the text is wrapped in an `mstts:express-as` element.
pub fn render_ssml(text: &str, voice: &str, style: Option<&str>, language: &str) -> String {
    let inner = match style {
        Some(style) => format!(
            "<mstts:express-as style=\"{style}\">\n    {text}\n</mstts:express-as>"
        ),
        None => text.to_string(),
    };

    format!(
        "<speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\"\n    \
         xmlns:mstts=\"https://www.w3.org/2001/mstts\" xml:lang=\"{language}\">\n    \
         <voice name=\"{voice}\">\n        {inner}\n    </voice>\n</speak>\n"
    )
}
