//! Minimal unified line diff for canonical JSON renderings.
//!
//! Shows how the committed snapshot drifted from the generated document.
//! Quadratic LCS over the line vectors; snapshot renderings are small.

const CONTEXT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Equal,
    Delete,
    Insert,
}

/// One edit step. `old`/`new` are the line positions before the step applies.
#[derive(Debug, Clone, Copy)]
struct Op {
    tag: Tag,
    old: usize,
    new: usize,
}

/// Render a unified diff (`---`/`+++`/`@@` headers, 3 context lines) between
/// two texts. Returns an empty string when the texts have identical lines.
pub fn unified_diff(from: &str, to: &str, from_label: &str, to_label: &str) -> String {
    let old: Vec<&str> = from.lines().collect();
    let new: Vec<&str> = to.lines().collect();
    let ops = diff_ops(&old, &new);
    let hunks = group_hunks(&ops, CONTEXT);
    if hunks.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("--- {from_label}\n"));
    out.push_str(&format!("+++ {to_label}\n"));
    for hunk in hunks {
        render_hunk(&mut out, &ops[hunk], &old, &new);
    }
    out
}

fn diff_ops(old: &[&str], new: &[&str]) -> Vec<Op> {
    let n = old.len();
    let m = new.len();
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        let tag = if old[i] == new[j] {
            Tag::Equal
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            Tag::Delete
        } else {
            Tag::Insert
        };
        ops.push(Op { tag, old: i, new: j });
        match tag {
            Tag::Equal => {
                i += 1;
                j += 1;
            }
            Tag::Delete => i += 1,
            Tag::Insert => j += 1,
        }
    }
    while i < n {
        ops.push(Op {
            tag: Tag::Delete,
            old: i,
            new: j,
        });
        i += 1;
    }
    while j < m {
        ops.push(Op {
            tag: Tag::Insert,
            old: i,
            new: j,
        });
        j += 1;
    }
    ops
}

/// Group op indices into hunk ranges, keeping `context` equal lines around
/// each change and merging hunks whose context would overlap.
fn group_hunks(ops: &[Op], context: usize) -> Vec<std::ops::Range<usize>> {
    let changed: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| op.tag != Tag::Equal)
        .map(|(idx, _)| idx)
        .collect();
    let Some((&first, rest)) = changed.split_first() else {
        return Vec::new();
    };

    let mut hunks = Vec::new();
    let mut start = first.saturating_sub(context);
    let mut end = (first + context + 1).min(ops.len());
    for &idx in rest {
        if idx.saturating_sub(context) <= end {
            end = (idx + context + 1).min(ops.len());
        } else {
            hunks.push(start..end);
            start = idx.saturating_sub(context);
            end = (idx + context + 1).min(ops.len());
        }
    }
    hunks.push(start..end);
    hunks
}

fn render_hunk(out: &mut String, ops: &[Op], old: &[&str], new: &[&str]) {
    let first = ops[0];
    let old_len = ops.iter().filter(|op| op.tag != Tag::Insert).count();
    let new_len = ops.iter().filter(|op| op.tag != Tag::Delete).count();
    out.push_str(&format!(
        "@@ -{} +{} @@\n",
        format_range(first.old, old_len),
        format_range(first.new, new_len)
    ));
    for op in ops {
        match op.tag {
            Tag::Equal => {
                out.push(' ');
                out.push_str(old[op.old]);
            }
            Tag::Delete => {
                out.push('-');
                out.push_str(old[op.old]);
            }
            Tag::Insert => {
                out.push('+');
                out.push_str(new[op.new]);
            }
        }
        out.push('\n');
    }
}

/// Hunk range in unified format: 1-based start, length omitted when 1.
/// Empty ranges report the 0-based position (the line before) with `,0`.
fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{len}", start + 1),
    }
}
