/// Sample business scenario used when a request supplies no context.
pub const DEFAULT_CONTEXT: &str = include_str!("../assets/default_context.txt");

/// Pick the context for a run: the caller's text, or the default when it is
/// absent or blank.
pub fn resolve_context(requested: Option<String>) -> String {
    requested
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONTEXT.to_string())
}
