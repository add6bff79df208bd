use rust_embed::RustEmbed;

/// Page template, script and stylesheet, compiled into the binary.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/assets/"]
pub struct Assets;

const CONTEXT_PLACEHOLDER: &str = "{{default_context}}";

/// Render the index page with `context` pre-filled in the textarea.
/// Returns `None` if the template is missing from the build.
pub fn render_index(context: &str) -> Option<String> {
    let template = Assets::get("index.html")?;
    let template = String::from_utf8_lossy(&template.data);
    Some(template.replace(CONTEXT_PLACEHOLDER, &escape_html(context)))
}

/// Escape text for use inside HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
