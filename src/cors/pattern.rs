//! Ant-style path patterns used to scope CORS rules.
//!
//! Supported syntax, segment by segment:
//! - `**` matches zero or more whole segments
//! - `{name}` matches exactly one non-empty segment
//! - `*` matches zero or more characters inside a segment
//! - `?` matches exactly one character inside a segment

use super::CorsConfigError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// `**`
    AnyDepth,
    /// `{var}`
    Variable,
    /// Literal text, possibly containing `*` and `?`
    Glob(String),
}

/// A compiled path pattern such as `/banque/**`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern. It must start with `/` and may only use `**` as a whole segment.
    pub fn parse(pattern: &str) -> Result<Self, CorsConfigError> {
        let invalid = |reason: &str| CorsConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if !pattern.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut segments = Vec::new();
        for part in split_segments(pattern) {
            let segment = if part == "**" {
                Segment::AnyDepth
            } else if part.contains("**") {
                return Err(invalid("'**' must be a whole path segment"));
            } else if part.starts_with('{') && part.ends_with('}') && part.len() > 2 {
                Segment::Variable
            } else if part.contains('{') || part.contains('}') {
                return Err(invalid("unbalanced '{' or '}'"));
            } else {
                Segment::Glob(part.to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as it was written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `path` (the request path, without query) matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split_segments(path).collect();
        match_segments(&self.segments, &parts)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            None => false,
            Some((part, path_rest)) => {
                let ok = match segment {
                    Segment::Variable => true,
                    Segment::Glob(glob) => match_glob(glob.as_bytes(), part.as_bytes()),
                    Segment::AnyDepth => unreachable!("handled above"),
                };
                ok && match_segments(rest, path_rest)
            }
        },
    }
}

/// Match a single segment against a glob made of literals, `*` and `?`.
fn match_glob(glob: &[u8], text: &[u8]) -> bool {
    let (mut g, mut t) = (0, 0);
    // Position of the last `*` seen in the glob, and the text index it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match glob.get(g) {
            Some(b'*') => {
                backtrack = Some((g, t));
                g += 1;
            }
            Some(b'?') => {
                g += 1;
                t += 1;
            }
            Some(&c) if c == text[t] => {
                g += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, tried)) => {
                    g = star + 1;
                    t = tried + 1;
                    backtrack = Some((star, tried + 1));
                }
                None => return false,
            },
        }
    }

    glob[g..].iter().all(|&c| c == b'*')
}
