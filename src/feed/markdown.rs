use pulldown_cmark::{html, Event, Options, Parser};

/// Render an issue body (GitHub-flavored Markdown) to HTML.
///
/// Raw HTML blocks and inline tags in the source are emitted as escaped text,
/// never passed through, so a body cannot inject markup into a reader.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markdown() {
        let html = to_html("## Steps\n\n1. run `cargo test`\n2. **panic**");
        assert!(html.contains("<h2>Steps</h2>"));
        assert!(html.contains("<code>cargo test</code>"));
        assert!(html.contains("<strong>panic</strong>"));
    }

    #[test]
    fn test_task_list_and_strikethrough() {
        let html = to_html("- [x] done\n- [ ] ~~todo~~");
        assert!(html.contains("checkbox"));
        assert!(html.contains("<del>todo</del>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = to_html("hello <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(to_html(""), "");
    }
}
