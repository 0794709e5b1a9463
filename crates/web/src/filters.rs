//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use askama::filters::Safe;

/// Render Markdown to HTML. Raw HTML in the source is not passed through.
///
/// Usage in templates: `{{ item.description|markdown }}`
#[askama::filter_fn]
pub fn markdown(value: impl Display, _env: &dyn askama::Values) -> askama::Result<Safe<String>> {
    Ok(Safe(render_markdown(&value.to_string())))
}

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

fn render_markdown(source: &str) -> String {
    let mut options = comrak::Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    comrak::markdown_to_html(source, &options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_renders_emphasis() {
        assert_eq!(render_markdown("**Segar**"), "<p><strong>Segar</strong></p>\n");
    }

    #[test]
    fn test_markdown_drops_raw_html() {
        let html = render_markdown("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
    }
}
