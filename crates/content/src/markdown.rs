use pulldown_cmark::{Options, Parser, html};

/// Render a markdown body to HTML.
///
/// Tables, footnotes, strikethrough and task lists are enabled. Raw HTML
/// inside the markdown is emitted as-is; post bodies are trusted content.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
