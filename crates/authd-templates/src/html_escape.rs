/// Escapes a value for placement into an HTML text node: entities first, then
/// every newline variant (real or literal backslash-escaped) becomes `<br>`.
/// Order matters — `&` must be escaped before the entities that contain it
/// are introduced, and the newline passes must run after the entity passes
/// so they never touch `&amp;`-style text.
pub fn escape(input: &str) -> String {
    let mut out = input.replace('&', "&amp;");
    out = out.replace('"', "&quot;");
    out = out.replace('\'', "&apos;");
    out = out.replace('<', "&lt;");
    out = out.replace('>', "&gt;");
    out = out.replace("\\r\\n", "<br>");
    out = out.replace("\\n\\r", "<br>");
    out = out.replace("\\n", "<br>");
    out = out.replace("\r\n", "<br>");
    out = out.replace("\n\r", "<br>");
    out = out.replace('\n', "<br>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_entities() {
        assert_eq!(escape(r#"<a href="x">it's & done</a>"#), "&lt;a href=&quot;x&quot;&gt;it&apos;s &amp; done&lt;/a&gt;");
    }

    #[test]
    fn converts_real_newlines_to_br() {
        assert_eq!(escape("line1\r\nline2\nline3"), "line1<br>line2<br>line3");
    }

    #[test]
    fn converts_literal_backslash_newlines_to_br() {
        assert_eq!(escape("line1\\r\\nline2\\nline3"), "line1<br>line2<br>line3");
    }

    #[test]
    fn is_idempotent_on_already_escaped_output() {
        let escaped = escape("<script>");
        assert_eq!(escape(&escaped), escaped);
    }

    #[test]
    fn no_raw_special_characters_survive() {
        assert_eq!(escape("<>&\"'"), "&lt;&gt;&amp;&quot;&apos;");
    }
}
