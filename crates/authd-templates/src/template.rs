use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\$([A-Z_]+)\$\$").unwrap());

#[derive(Debug, Clone)]
enum Chunk {
    Literal(String),
    Placeholder(String),
}

/// A template pre-tokenized at load time into literal chunks and placeholder
/// names, line by line, so a request never re-parses `$$NAME$$` syntax.
#[derive(Debug, Clone)]
pub struct Template {
    lines: Vec<Vec<Chunk>>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let lines = source.lines().map(tokenize_line).collect();
        Self { lines }
    }

    /// Single-pass substitution per line; a placeholder with no entry in
    /// `vars` is replaced with an empty string rather than failing.
    pub fn render(&self, vars: &HashMap<&str, String>) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            for chunk in line {
                match chunk {
                    Chunk::Literal(text) => out.push_str(text),
                    Chunk::Placeholder(name) => {
                        if let Some(value) = vars.get(name.as_str()) {
                            out.push_str(value);
                        }
                    }
                }
            }
        }
        out
    }
}

fn tokenize_line(line: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut last_end = 0;
    for capture in PLACEHOLDER_RE.captures_iter(line) {
        let whole = capture.get(0).unwrap();
        if whole.start() > last_end {
            chunks.push(Chunk::Literal(line[last_end..whole.start()].to_string()));
        }
        chunks.push(Chunk::Placeholder(capture[1].to_string()));
        last_end = whole.end();
    }
    if last_end < line.len() {
        chunks.push(Chunk::Literal(line[last_end..].to_string()));
    }
    chunks
}
