//! Shell-style glob matching over forward-slash relative paths.
//!
//! Supported syntax:
//! - `*` any run of characters within one path segment
//! - `?` exactly one character within a segment
//! - `[abc]`, `[a-z]`, `[!a-z]` / `[^a-z]` character classes
//! - `**` any run of characters across segments; `**/` also matches no directory
//!
//! A malformed pattern (unterminated class) never matches anything.

use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyChar,
    Star,
    GlobStar,
    /// `**/`: zero or more whole directories.
    AnyDirs,
    Class { negated: bool, ranges: Vec<(char, char)> },
}

/// A compiled glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    /// `None` when the source was malformed.
    tokens: Option<Vec<Token>>,
}

impl Pattern {
    /// Compile a pattern. Backslashes are treated as path separators.
    pub fn new(source: &str) -> Self {
        let normalized = source.replace('\\', "/");
        let tokens = tokenize(&normalized);
        Self {
            source: normalized,
            tokens,
        }
    }

    /// The pattern as written (separators normalized).
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether this pattern failed to compile.
    pub fn is_malformed(&self) -> bool {
        self.tokens.is_none()
    }

    /// Test a relative path against this pattern.
    pub fn matches(&self, rel_path: &str) -> bool {
        let Some(tokens) = &self.tokens else {
            return false;
        };
        let text: Vec<char> = rel_path.replace('\\', "/").chars().collect();
        match_tokens(tokens, &text)
    }

    /// Leading directory segments that contain no wildcard.
    ///
    /// `trips/2019/seq_*.jpg` → `trips/2019`; `*.jpg` → `""`.
    pub fn literal_dir(&self) -> &str {
        let mut end = 0;
        let mut offset = 0;
        for segment in self.source.split('/') {
            let seg_end = offset + segment.len();
            if is_glob(segment) || seg_end >= self.source.len() {
                break;
            }
            end = seg_end;
            offset = seg_end + 1;
        }
        &self.source[..end]
    }
}

/// Whether a string contains glob metacharacters.
pub fn is_glob(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// True when `rel_path` matches any of `patterns`.
pub fn matches<S: AsRef<str>>(rel_path: &str, patterns: &[S]) -> bool {
    patterns
        .iter()
        .any(|p| Pattern::new(p.as_ref()).matches(rel_path))
}

/// Keep the paths that match at least one pattern.
///
/// The result is a set; callers that need a particular order sort it themselves.
pub fn filter_directory<P, S>(rel_paths: &[P], patterns: &[S]) -> BTreeSet<String>
where
    P: AsRef<str>,
    S: AsRef<str>,
{
    let compiled: Vec<Pattern> = patterns.iter().map(|p| Pattern::new(p.as_ref())).collect();
    rel_paths
        .iter()
        .filter_map(|p| {
            let path: &str = p.as_ref();
            compiled
                .iter()
                .any(|pattern| pattern.matches(path))
                .then(|| path.to_string())
        })
        .collect()
}

fn tokenize(source: &str) -> Option<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                // Runs like `***` collapse into one globstar
                let run = chars[i..].iter().take_while(|&&c| c == '*').count();
                i += run;
                if run == 1 {
                    tokens.push(Token::Star);
                } else if chars.get(i) == Some(&'/') {
                    tokens.push(Token::AnyDirs);
                    i += 1;
                } else {
                    tokens.push(Token::GlobStar);
                }
            }
            '?' => {
                tokens.push(Token::AnyChar);
                i += 1;
            }
            '[' => {
                let (token, next) = parse_class(&chars, i + 1)?;
                tokens.push(token);
                i = next;
            }
            c => {
                tokens.push(Token::Literal(c));
                i += 1;
            }
        }
    }

    Some(tokens)
}

/// Parse a class body starting just after `[`. Returns the token and the index after `]`.
fn parse_class(chars: &[char], start: usize) -> Option<(Token, usize)> {
    let mut i = start;
    let negated = matches!(chars.get(i), Some('!') | Some('^'));
    if negated {
        i += 1;
    }

    let mut ranges = Vec::new();
    let mut first = true;
    loop {
        let c = *chars.get(i)?;
        // A `]` directly after the opening bracket is a literal member.
        if c == ']' && !first {
            return Some((Token::Class { negated, ranges }, i + 1));
        }
        if c == '/' {
            return None;
        }
        first = false;

        if chars.get(i + 1) == Some(&'-') && chars.get(i + 2).is_some_and(|&e| e != ']') {
            let end = chars[i + 2];
            if end < c {
                return None;
            }
            ranges.push((c, end));
            i += 3;
        } else {
            ranges.push((c, c));
            i += 1;
        }
    }
}

fn class_contains(negated: bool, ranges: &[(char, char)], c: char) -> bool {
    let hit = ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
    hit != negated
}

/// Bottom-up match: `dp[i][j]` is true when `tokens[i..]` matches `text[j..]`.
fn match_tokens(tokens: &[Token], text: &[char]) -> bool {
    let n = text.len();
    let mut next = vec![false; n + 1];
    next[n] = true;

    for token in tokens.iter().rev() {
        let mut cur = vec![false; n + 1];
        for j in (0..=n).rev() {
            cur[j] = match token {
                Token::Literal(c) => j < n && text[j] == *c && next[j + 1],
                Token::AnyChar => j < n && text[j] != '/' && next[j + 1],
                Token::Class { negated, ranges } => {
                    j < n
                        && text[j] != '/'
                        && class_contains(*negated, ranges, text[j])
                        && next[j + 1]
                }
                Token::Star => next[j] || (j < n && text[j] != '/' && cur[j + 1]),
                Token::GlobStar => next[j] || (j < n && cur[j + 1]),
                Token::AnyDirs => {
                    next[j] || (j + 1..=n).any(|k| text[k - 1] == '/' && next[k])
                }
            };
        }
        next = cur;
    }

    next[0]
}
