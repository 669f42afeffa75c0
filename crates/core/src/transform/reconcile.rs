//! Source reconciliation: diff-then-replay position mapping
//!
//! Compares an original buffer against its transformed counterpart, cleans
//! the resulting edit script, and replays it to produce the final text plus
//! a line-based position map. Diffing is line-granular: transforms emitted
//! by a printer change whole lines, and line anchors are what downstream
//! debuggers consume.

use serde::Serialize;

/// One contiguous diff edit over the original/transformed pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Equal(String),
    Insert(String),
    Delete(String),
}

/// Line-based mapping between original and reconciled text
#[derive(Debug, Clone, Serialize)]
pub struct PositionMap {
    /// Identifier the map is keyed to (usually the module path)
    pub name: String,
    /// Pairs of (original line, generated line), zero-based
    pub mappings: Vec<(u32, u32)>,
}

/// Result of a non-trivial reconciliation
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub text: String,
    pub map: PositionMap,
}

/// Diff `original` against `transformed` and replay the edits.
///
/// Returns `None` when no edit was applied (the buffers are identical), so
/// callers can reuse a prior mapping unchanged.
pub fn reconcile(name: &str, original: &str, transformed: &str) -> Option<Reconciled> {
    let edits = cleanup(diff_lines(original, transformed));
    let replay = apply_edits(&edits, name);
    if replay.applied == 0 {
        return None;
    }
    Some(Reconciled {
        text: replay.text,
        map: replay.map,
    })
}

/// Compute a line-granularity edit script via longest common subsequence.
///
/// Pure function of its inputs; the replay step below is tested against it
/// independently.
pub fn diff_lines(original: &str, transformed: &str) -> Vec<Edit> {
    let old: Vec<&str> = split_lines(original);
    let new: Vec<&str> = split_lines(transformed);

    // Classic LCS length table, then backtrack into an edit script.
    let n = old.len();
    let m = new.len();
    let mut table = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if old[i] == new[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut edits = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            edits.push(Edit::Equal(old[i].to_string()));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            edits.push(Edit::Delete(old[i].to_string()));
            i += 1;
        } else {
            edits.push(Edit::Insert(new[j].to_string()));
            j += 1;
        }
    }
    for line in &old[i..] {
        edits.push(Edit::Delete(line.to_string()));
    }
    for line in &new[j..] {
        edits.push(Edit::Insert(line.to_string()));
    }
    edits
}

/// Semantic cleanup: merge adjacent edits of the same kind, drop empties,
/// and turn a delete/insert pair of identical text back into an equal.
pub fn cleanup(edits: Vec<Edit>) -> Vec<Edit> {
    let mut merged: Vec<Edit> = Vec::with_capacity(edits.len());
    for edit in edits {
        let empty = match &edit {
            Edit::Equal(s) | Edit::Insert(s) | Edit::Delete(s) => s.is_empty(),
        };
        if empty {
            continue;
        }
        match (merged.last_mut(), edit) {
            (Some(Edit::Equal(prev)), Edit::Equal(next)) => prev.push_str(&next),
            (Some(Edit::Insert(prev)), Edit::Insert(next)) => prev.push_str(&next),
            (Some(Edit::Delete(prev)), Edit::Delete(next)) => prev.push_str(&next),
            (_, edit) => merged.push(edit),
        }
    }

    let mut cleaned: Vec<Edit> = Vec::with_capacity(merged.len());
    for edit in merged {
        if let (Some(Edit::Delete(deleted)), Edit::Insert(inserted)) = (cleaned.last(), &edit) {
            if deleted == inserted {
                let text = inserted.clone();
                cleaned.pop();
                match cleaned.last_mut() {
                    Some(Edit::Equal(prev)) => prev.push_str(&text),
                    _ => cleaned.push(Edit::Equal(text)),
                }
                continue;
            }
        }
        cleaned.push(edit);
    }
    cleaned
}

struct Replay {
    text: String,
    map: PositionMap,
    /// Count of non-equal edits applied
    applied: usize,
}

/// Replay an edit script, synthesizing the reconciled text and line map.
///
/// A delete immediately followed by an insert collapses into one in-place
/// replacement anchored at the first non-whitespace character of the
/// deleted span, so shared leading indentation stays put and line anchors
/// remain aligned.
fn apply_edits(edits: &[Edit], name: &str) -> Replay {
    let mut text = String::new();
    let mut mappings = Vec::new();
    let mut orig_line: u32 = 0;
    let mut new_line: u32 = 0;
    let mut applied = 0;

    let mut idx = 0;
    while idx < edits.len() {
        match &edits[idx] {
            Edit::Equal(span) => {
                for _ in 0..count_lines(span) {
                    mappings.push((orig_line, new_line));
                    orig_line += 1;
                    new_line += 1;
                }
                text.push_str(span);
                idx += 1;
            }
            Edit::Delete(deleted) => {
                if let Some(Edit::Insert(inserted)) = edits.get(idx + 1) {
                    // In-place replacement. The spans share their leading
                    // indentation bytes, so the splice keeps them in place
                    // and the edit is effectively anchored at the first
                    // non-whitespace character of the deleted span; the line
                    // anchor recorded here stays aligned with the original.
                    let keep = shared_indent_len(deleted, inserted);
                    text.push_str(&deleted[..keep]);
                    text.push_str(&inserted[keep..]);
                    mappings.push((orig_line, new_line));
                    orig_line += count_lines(deleted);
                    new_line += count_lines(inserted);
                    applied += 1;
                    idx += 2;
                } else {
                    orig_line += count_lines(deleted);
                    applied += 1;
                    idx += 1;
                }
            }
            Edit::Insert(inserted) => {
                // Splices at the current position without consuming any
                // original span, so later edits keep their anchors.
                text.push_str(inserted);
                new_line += count_lines(inserted);
                applied += 1;
                idx += 1;
            }
        }
    }

    Replay {
        text,
        map: PositionMap {
            name: name.to_string(),
            mappings,
        },
        applied,
    }
}

fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split_inclusive('\n').collect()
}

fn count_lines(span: &str) -> u32 {
    split_lines(span).len() as u32
}

/// Length of the whitespace prefix shared by the deleted and inserted spans.
fn shared_indent_len(deleted: &str, inserted: &str) -> usize {
    deleted
        .bytes()
        .zip(inserted.bytes())
        .take_while(|(d, i)| d == i && (*d == b' ' || *d == b'\t'))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_noop_returns_none() {
        assert!(reconcile("m", "", "").is_none());
        assert!(reconcile("m", "const x = 1;", "const x = 1;").is_none());
        let multi = "a\nb\nc\n";
        assert!(reconcile("m", multi, multi).is_none());
    }

    #[test]
    fn test_reconcile_replays_to_transformed_text() {
        let original = "const x=1;";
        let transformed = "const x = 1;\n//added";
        let result = reconcile("m", original, transformed).unwrap();
        assert_eq!(result.text, transformed);
        assert_eq!(result.map.name, "m");
        assert!(!result.map.mappings.is_empty());
    }

    #[test]
    fn test_reconcile_preserves_equal_line_anchors() {
        let original = "import a;\nconst x=1;\nexport x;\n";
        let transformed = "import a;\nconst x = 1;\nexport x;\n";
        let result = reconcile("m", original, transformed).unwrap();
        assert_eq!(result.text, transformed);
        // Unchanged lines map straight across.
        assert!(result.map.mappings.contains(&(0, 0)));
        assert!(result.map.mappings.contains(&(2, 2)));
        // The replaced line keeps its anchor.
        assert!(result.map.mappings.contains(&(1, 1)));
    }

    #[test]
    fn test_reconcile_pure_insert_shifts_following_lines() {
        let original = "a\nb\n";
        let transformed = "a\ninserted\nb\n";
        let result = reconcile("m", original, transformed).unwrap();
        assert_eq!(result.text, transformed);
        assert!(result.map.mappings.contains(&(0, 0)));
        assert!(result.map.mappings.contains(&(1, 2)));
    }

    #[test]
    fn test_reconcile_pure_delete() {
        let original = "a\ngone\nb\n";
        let transformed = "a\nb\n";
        let result = reconcile("m", original, transformed).unwrap();
        assert_eq!(result.text, transformed);
        assert!(result.map.mappings.contains(&(2, 1)));
    }

    #[test]
    fn test_diff_edits_cover_both_buffers() {
        let original = "one\ntwo\nthree\n";
        let transformed = "one\n2\nthree\nfour\n";
        let edits = diff_lines(original, transformed);

        let mut from_old = String::new();
        let mut from_new = String::new();
        for edit in &edits {
            match edit {
                Edit::Equal(s) => {
                    from_old.push_str(s);
                    from_new.push_str(s);
                }
                Edit::Delete(s) => from_old.push_str(s),
                Edit::Insert(s) => from_new.push_str(s),
            }
        }
        assert_eq!(from_old, original);
        assert_eq!(from_new, transformed);
    }

    #[test]
    fn test_cleanup_merges_adjacent_edits() {
        let edits = vec![
            Edit::Delete("a\n".to_string()),
            Edit::Delete("b\n".to_string()),
            Edit::Insert(String::new()),
            Edit::Equal("c\n".to_string()),
            Edit::Equal("d\n".to_string()),
        ];
        let cleaned = cleanup(edits);
        assert_eq!(
            cleaned,
            vec![
                Edit::Delete("a\nb\n".to_string()),
                Edit::Equal("c\nd\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_cleanup_collapses_identical_delete_insert() {
        let edits = vec![
            Edit::Delete("same\n".to_string()),
            Edit::Insert("same\n".to_string()),
        ];
        assert_eq!(cleanup(edits), vec![Edit::Equal("same\n".to_string())]);
    }
}
