// 🔍 Single-line comparison for staged changes
// Renders an original/new pair the way a line differ does, with marker
// lines under each side pointing at the characters that moved.

use similar::{DiffTag, TextDiff};
use std::fmt;

/// Result of comparing a record's committed line with its current line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    Unchanged(String),
    Changed {
        original: String,
        original_marks: String,
        current: String,
        current_marks: String,
    },
}

impl Comparison {
    pub fn is_changed(&self) -> bool {
        matches!(self, Comparison::Changed { .. })
    }
}

/// Compare two serialized lines.
///
/// Markers: `^` under replaced characters, `-` under characters only in the
/// original, `+` under characters only in the current line.
pub fn compare(original: &str, current: &str) -> Comparison {
    if original == current {
        return Comparison::Unchanged(original.to_string());
    }

    let diff = TextDiff::from_chars(original, current);
    let mut original_marks = String::new();
    let mut current_marks = String::new();

    for op in diff.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        let (old_mark, new_mark) = match tag {
            DiffTag::Equal => (' ', ' '),
            DiffTag::Delete => ('-', ' '),
            DiffTag::Insert => (' ', '+'),
            DiffTag::Replace => ('^', '^'),
        };
        original_marks.extend(std::iter::repeat(old_mark).take(old_range.len()));
        current_marks.extend(std::iter::repeat(new_mark).take(new_range.len()));
    }

    Comparison::Changed {
        original: original.to_string(),
        original_marks: original_marks.trim_end().to_string(),
        current: current.to_string(),
        current_marks: current_marks.trim_end().to_string(),
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Unchanged(line) => writeln!(f, "no diff  : {}", line),
            Comparison::Changed {
                original,
                original_marks,
                current,
                current_marks,
            } => {
                writeln!(f, "original : - {}", original)?;
                writeln!(f, "{}", format!("           ? {}", original_marks).trim_end())?;
                writeln!(f, "new value: + {}", current)?;
                writeln!(f, "{}", format!("           ? {}", current_marks).trim_end())
            }
        }
    }
}
