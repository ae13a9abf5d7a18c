// src/utils/html.rs

/// Sanitizes author-supplied text (question content, option text, exam title
/// and description) before it is stored.
///
/// Whitelist-based: safe inline tags survive, `<script>` and event-handler
/// attributes are stripped along with their content.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Like `clean_html`, but maps whitespace-only results to `None`.
pub fn clean_optional(input: Option<&str>) -> Option<String> {
    input
        .map(clean_html)
        .filter(|cleaned| !cleaned.trim().is_empty())
}
