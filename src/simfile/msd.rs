//! MSD tokenizer (`#TAG:value:value;`) shared by `.sm` and `.ssc` files

use tracing::warn;

/// A single `#...;` parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Line the parameter started on (1-based)
    pub line: usize,
    /// Colon-separated components; the first one is the tag
    pub components: Vec<String>,
}

impl Param {
    /// Upper-cased tag name
    pub fn tag(&self) -> String {
        self.components
            .first()
            .map(|t| t.trim().to_ascii_uppercase())
            .unwrap_or_default()
    }

    /// Component `i` (0 is the tag), trimmed
    pub fn get(&self, i: usize) -> &str {
        self.components.get(i).map(|c| c.trim()).unwrap_or("")
    }

    /// Everything after the tag, re-joined with ':'
    pub fn value(&self) -> String {
        if self.components.len() <= 1 {
            return String::new();
        }
        self.components[1..].join(":").trim().to_string()
    }
}

/// Split MSD text into parameters
pub fn parse(text: &str) -> Vec<Param> {
    let text = text.trim_start_matches('\u{FEFF}');
    let mut params = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    let mut in_param = false;
    let mut start_line = 0;
    let mut components: Vec<String> = Vec::new();
    let mut current = String::new();

    while let Some(c) = chars.next() {
        // Comments run to end of line, inside or outside parameters
        if c == '/' && chars.peek() == Some(&'/') {
            while let Some(&n) = chars.peek() {
                if n == '\n' {
                    break;
                }
                chars.next();
            }
            continue;
        }

        if !in_param {
            match c {
                '#' => {
                    in_param = true;
                    start_line = line;
                    components.clear();
                    current.clear();
                }
                '\n' => line += 1,
                _ => {}
            }
            continue;
        }

        match c {
            '\\' => {
                if let Some(n) = chars.next() {
                    if n == '\n' {
                        line += 1;
                    }
                    current.push(n);
                }
            }
            ':' => components.push(std::mem::take(&mut current)),
            ';' => {
                components.push(std::mem::take(&mut current));
                params.push(Param {
                    line: start_line,
                    components: std::mem::take(&mut components),
                });
                in_param = false;
            }
            '\n' => {
                line += 1;
                current.push('\n');

                // A '#' opening a line means the previous ';' was forgotten
                let mut lookahead = chars.clone();
                while matches!(lookahead.peek(), Some(' ' | '\t' | '\r')) {
                    lookahead.next();
                }
                if lookahead.peek() == Some(&'#') {
                    warn!(line = start_line, "parameter is missing its terminating ';'");
                    components.push(std::mem::take(&mut current));
                    params.push(Param {
                        line: start_line,
                        components: std::mem::take(&mut components),
                    });
                    in_param = false;
                }
            }
            _ => current.push(c),
        }
    }

    if in_param {
        warn!(line = start_line, "unterminated parameter at end of file");
        components.push(current);
        params.push(Param {
            line: start_line,
            components,
        });
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_params() {
        let params = parse("#TITLE:Song;\n#BPMS:0.000=120.000;\n");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].tag(), "TITLE");
        assert_eq!(params[0].value(), "Song");
        assert_eq!(params[1].line, 2);
        assert_eq!(params[1].value(), "0.000=120.000");
    }

    #[test]
    fn test_comments_are_skipped() {
        let params = parse("// header\n#TITLE:A // trailing\n;\n");
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].value(), "A");
    }

    #[test]
    fn test_missing_semicolon_recovers() {
        let params = parse("#TITLE:A\n#ARTIST:B;");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].value(), "A");
        assert_eq!(params[1].tag(), "ARTIST");
        assert_eq!(params[1].value(), "B");
    }

    #[test]
    fn test_components_and_escape() {
        let params = parse("#NOTES:dance-single:desc\\:x:Hard:9:0,0:\n0000\n;");
        let p = &params[0];
        assert_eq!(p.get(1), "dance-single");
        assert_eq!(p.get(2), "desc:x");
        assert_eq!(p.get(3), "Hard");
        assert_eq!(p.get(6), "0000");
    }

    #[test]
    fn test_bom_and_lowercase_tag() {
        let params = parse("\u{FEFF}#title:X;");
        assert_eq!(params[0].tag(), "TITLE");
    }
}
