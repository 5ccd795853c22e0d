use once_cell::sync::Lazy;
use regex::Regex;

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#.*").unwrap());
static CONFIG_FILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+\.conf$").unwrap());
static EDITOR_TEMP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^~[A-Za-z0-9]*\.conf$").unwrap());

/// Strips a trailing `#...` comment and surrounding whitespace. Returns
/// `None` for a blank line.
pub fn strip_comment_and_trim(line: &str) -> Option<String> {
    let without_comment = COMMENT_RE.replace(line, "");
    let trimmed = without_comment.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Splits `key = value` on the first `=`, trimming both sides. Lines with no
/// `=` are not settings and are returned as `None`.
pub fn split_key_value(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    Some((key.trim().to_string(), value.trim().to_string()))
}

pub fn is_config_file_name(name: &str) -> bool {
    CONFIG_FILE_RE.is_match(name)
}

pub fn is_editor_temp_name(name: &str) -> bool {
    EDITOR_TEMP_RE.is_match(name)
}

/// The id of a client/resource-server config is its file stem.
pub fn id_from_file_name(name: &str) -> &str {
    name.strip_suffix(".conf").unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_and_whitespace() {
        assert_eq!(
            strip_comment_and_trim("  auth_code_lifetime = 60 # seconds"),
            Some("auth_code_lifetime = 60".to_string())
        );
    }

    #[test]
    fn blank_and_comment_only_lines_are_none() {
        assert_eq!(strip_comment_and_trim("   "), None);
        assert_eq!(strip_comment_and_trim("# just a comment"), None);
    }

    #[test]
    fn splits_on_first_equals_only() {
        assert_eq!(
            split_key_value("redirect_uri = http://a=b"),
            Some(("redirect_uri".to_string(), "http://a=b".to_string()))
        );
    }

    #[test]
    fn recognizes_config_and_editor_temp_names() {
        assert!(is_config_file_name("c1.conf"));
        assert!(!is_config_file_name("~c1.conf"));
        assert!(is_editor_temp_name("~c1.conf"));
        assert!(!is_editor_temp_name("c1.conf"));
    }
}
