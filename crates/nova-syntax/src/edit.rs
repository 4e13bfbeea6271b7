//! Text edit primitives.

use crate::Span;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextEdit {
    pub range: Span,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(range: Span, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn delete(range: Span) -> Self {
        Self::new(range, "")
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(Span::new(offset, offset), text)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("edit range {range:?} is out of bounds for text length {text_len}")]
    RangeOutOfBounds { range: Span, text_len: usize },
    #[error("offset {offset} is not a UTF-8 character boundary")]
    InvalidUtf8Boundary { offset: usize },
    #[error("overlapping edits: {first:?} overlaps {second:?}")]
    OverlappingEdits { first: Span, second: Span },
}

/// Apply a list of edits to a text snapshot.
///
/// Edits are sorted by `(start, end)` and applied from the end of the text
/// backwards, so the result does not depend on the input order.
pub fn apply_text_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let mut edits = edits.to_vec();
    normalize_text_edits(text, &mut edits)?;

    let mut out = text.to_string();
    for edit in edits.into_iter().rev() {
        out.replace_range(edit.range.start..edit.range.end, &edit.replacement);
    }
    Ok(out)
}

/// Sort edits and check for overlaps / out-of-bounds ranges.
pub fn normalize_text_edits(text: &str, edits: &mut Vec<TextEdit>) -> Result<(), EditError> {
    edits.sort_by_key(|e| (e.range.start, e.range.end));

    let text_len = text.len();
    for edit in edits.iter() {
        if edit.range.start > edit.range.end || edit.range.end > text_len {
            return Err(EditError::RangeOutOfBounds {
                range: edit.range,
                text_len,
            });
        }
        for offset in [edit.range.start, edit.range.end] {
            if !text.is_char_boundary(offset) {
                return Err(EditError::InvalidUtf8Boundary { offset });
            }
        }
    }

    for pair in edits.windows(2) {
        let first = &pair[0];
        let second = &pair[1];
        if first.range.end > second.range.start
            || (first.range.is_empty()
                && second.range.is_empty()
                && first.range.start == second.range.start)
        {
            return Err(EditError::OverlappingEdits {
                first: first.range,
                second: second.range,
            });
        }
    }

    // Coalesce back-to-back edits.
    let mut merged: Vec<TextEdit> = Vec::with_capacity(edits.len());
    for edit in edits.drain(..) {
        if let Some(last) = merged.last_mut() {
            if last.range.end == edit.range.start {
                last.range = Span::new(last.range.start, edit.range.end);
                last.replacement.push_str(&edit.replacement);
                continue;
            }
        }
        merged.push(edit);
    }
    *edits = merged;

    Ok(())
}
