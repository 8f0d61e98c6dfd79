use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Question banks arrive as free text pasted or uploaded by trainers and are
/// later rendered to trainees, so every imported question/option string goes
/// through this whitelist-based sanitizer: safe inline tags (like <b>) are
/// preserved while <script>/<iframe> and event-handler attributes are
/// stripped. This serves as a fail-safe against Stored XSS.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
