/// Lazily-compiled static regex. Patterns are literals checked once at first
/// use; the compiled regex is shared for the life of the process.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}
