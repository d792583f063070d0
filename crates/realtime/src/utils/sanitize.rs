//! Cleaning of user supplied text before it is stored or broadcast.

/// Strips or neutralises unsafe markup.
pub trait TextSanitizer: Send + Sync {
    fn sanitize(&self, input: &str) -> String;
}

/// Escapes HTML so stored text renders literally in any client.
///
/// Control characters other than newlines and tabs are removed. Whitespace
/// is kept as sent, so document indentation survives.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSanitizer;

impl TextSanitizer for HtmlSanitizer {
    fn sanitize(&self, input: &str) -> String {
        let mut output = String::with_capacity(input.len());
        for ch in input.chars() {
            match ch {
                '&' => output.push_str("&amp;"),
                '<' => output.push_str("&lt;"),
                '>' => output.push_str("&gt;"),
                '"' => output.push_str("&quot;"),
                '\'' => output.push_str("&#x27;"),
                '\n' | '\t' => output.push(ch),
                c if c.is_control() => {}
                c => output.push(c),
            }
        }
        output
    }
}
