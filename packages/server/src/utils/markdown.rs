use pulldown_cmark::{Options, Parser, html};

/// Render untrusted markdown to HTML.
///
/// The source is HTML-escaped before parsing, so raw HTML in an entry body
/// never reaches the rendered output; only markdown-generated markup does.
pub fn render_markdown(source: &str) -> String {
    let escaped = escape_html(source);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(&escaped, options);
    let mut output = String::with_capacity(escaped.len() * 2);
    html::push_html(&mut output, parser);
    output
}

fn escape_html(source: &str) -> String {
    let mut escaped = String::with_capacity(source.len());
    for c in source.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
