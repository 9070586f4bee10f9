//! Coding-path segments used for error context.

use std::fmt;

/// One step of the coding path: a record key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named field of a record container.
    Key(String),
    /// A positional element of a sequence container.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, ".{key}"),
            PathSegment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Renders a coding path as `$.user.tags[2]`; the bare root renders as `$`.
pub(crate) fn render(segments: &[PathSegment]) -> String {
    let mut out = String::from("$");
    for segment in segments {
        match segment {
            PathSegment::Key(key) => {
                out.push('.');
                out.push_str(key);
            }
            PathSegment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_root() {
        assert_eq!(render(&[]), "$");
    }

    #[test]
    fn renders_mixed_path() {
        let path = vec![
            PathSegment::Key("user".into()),
            PathSegment::Key("tags".into()),
            PathSegment::Index(2),
        ];
        assert_eq!(render(&path), "$.user.tags[2]");
    }
}
