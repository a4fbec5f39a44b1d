//! Sequence similarity and line diffing built on the longest common
//! subsequence.

use std::iter::repeat;

/// Length of the longest common subsequence of `a` and `b`.
///
/// Shared prefix and suffix are counted directly; the rest uses a single DP
/// row sized to the shorter input.
pub fn lcs_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let (prefix, suffix) = common_ends(a, b);
    let a = &a[prefix..a.len() - suffix];
    let b = &b[prefix..b.len() - suffix];
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    prefix + suffix + lcs_row(long, short, false)[short.len()]
}

/// Lengths of the common prefix and of the common suffix after it.
fn common_ends<T: PartialEq>(a: &[T], b: &[T]) -> (usize, usize) {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    (prefix, suffix)
}

fn pick<T>(items: &[T], i: usize, reverse: bool) -> &T {
    if reverse {
        &items[items.len() - 1 - i]
    } else {
        &items[i]
    }
}

/// Last row of the LCS table: `row[j]` is the LCS of `a` and the first `j`
/// items of `b`. With `reverse`, both inputs are read back to front.
fn lcs_row<T: PartialEq>(a: &[T], b: &[T], reverse: bool) -> Vec<usize> {
    let mut row = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        let item = pick(a, i, reverse);
        let mut diag = 0usize;
        for j in 0..b.len() {
            let above = row[j + 1];
            row[j + 1] = if item == pick(b, j, reverse) {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }
    row
}

/// `2 * matches / (len(a) + len(b))`, where matches is the LCS length.
///
/// Symmetric, in `[0, 1]`, and `1.0` exactly when the sequences are equal
/// (including both empty).
pub fn sequence_ratio<T: PartialEq>(a: &[T], b: &[T]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_len(a, b) as f64 / total as f64
}

/// Character-level [`sequence_ratio`].
pub fn text_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    sequence_ratio(&a, &b)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOp {
    Context,
    Remove,
    Add,
}

/// One aligned line with its 0-based position in each input before it.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffLine<'a> {
    pub op: LineOp,
    pub text: &'a str,
    pub old_pos: usize,
    pub new_pos: usize,
}

/// Aligns two line lists, removals before additions inside a change.
///
/// Memory stays linear in the input size: the shared ends are trimmed and
/// the middle is split recursively (Hirschberg).
pub fn align<'a, S: AsRef<str>>(old: &'a [S], new: &'a [S]) -> Vec<DiffLine<'a>> {
    let old: Vec<&str> = old.iter().map(|s| s.as_ref()).collect();
    let new: Vec<&str> = new.iter().map(|s| s.as_ref()).collect();
    let (prefix, suffix) = common_ends(&old, &new);

    let mut ops = vec![LineOp::Context; prefix];
    split_align(
        &old[prefix..old.len() - suffix],
        &new[prefix..new.len() - suffix],
        &mut ops,
    );
    ops.extend(repeat(LineOp::Context).take(suffix));
    removals_first(&mut ops);

    let mut lines = Vec::with_capacity(ops.len());
    let (mut i, mut j) = (0usize, 0usize);
    for op in ops {
        let text = if op == LineOp::Add { new[j] } else { old[i] };
        lines.push(DiffLine {
            op,
            text,
            old_pos: i,
            new_pos: j,
        });
        match op {
            LineOp::Context => {
                i += 1;
                j += 1;
            }
            LineOp::Remove => i += 1,
            LineOp::Add => j += 1,
        }
    }
    lines
}

fn split_align(old: &[&str], new: &[&str], ops: &mut Vec<LineOp>) {
    match (old.len(), new.len()) {
        (0, n) => ops.extend(repeat(LineOp::Add).take(n)),
        (m, 0) => ops.extend(repeat(LineOp::Remove).take(m)),
        (1, n) => match new.iter().position(|line| *line == old[0]) {
            Some(k) => {
                ops.extend(repeat(LineOp::Add).take(k));
                ops.push(LineOp::Context);
                ops.extend(repeat(LineOp::Add).take(n - k - 1));
            }
            None => {
                ops.push(LineOp::Remove);
                ops.extend(repeat(LineOp::Add).take(n));
            }
        },
        (m, n) => {
            let mid = m / 2;
            let forward = lcs_row(&old[..mid], new, false);
            let backward = lcs_row(&old[mid..], new, true);
            let cut = (0..=n)
                .max_by_key(|&j| forward[j] + backward[n - j])
                .unwrap_or(0);
            split_align(&old[..mid], &new[..cut], ops);
            split_align(&old[mid..], &new[cut..], ops);
        }
    }
}

/// Reorders every run of changes so its removals precede its additions.
fn removals_first(ops: &mut [LineOp]) {
    for run in ops.split_mut(|op| *op == LineOp::Context) {
        let removed = run.iter().filter(|op| **op == LineOp::Remove).count();
        for (k, op) in run.iter_mut().enumerate() {
            *op = if k < removed {
                LineOp::Remove
            } else {
                LineOp::Add
            };
        }
    }
}

/// Renders a unified diff with `context` lines around each change.
///
/// Returns an empty string when the inputs are equal.
pub fn unified_diff<S: AsRef<str>>(
    old: &[S],
    new: &[S],
    old_label: &str,
    new_label: &str,
    context: usize,
) -> String {
    let aligned = align(old, new);
    let changes: Vec<usize> = aligned
        .iter()
        .enumerate()
        .filter(|(_, l)| l.op != LineOp::Context)
        .map(|(i, _)| i)
        .collect();
    if changes.is_empty() {
        return String::new();
    }

    // Windows closer than twice the context share a hunk.
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for &ci in &changes {
        let start = ci.saturating_sub(context);
        let end = (ci + context + 1).min(aligned.len());
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => ranges.push((start, end)),
        }
    }

    let mut out = vec![format!("--- {old_label}"), format!("+++ {new_label}")];
    for (start, end) in ranges {
        let hunk = &aligned[start..end];
        let old_count = hunk.iter().filter(|l| l.op != LineOp::Add).count();
        let new_count = hunk.iter().filter(|l| l.op != LineOp::Remove).count();
        out.push(format!(
            "@@ -{} +{} @@",
            format_range(hunk[0].old_pos, old_count),
            format_range(hunk[0].new_pos, new_count)
        ));
        for line in hunk {
            let sign = match line.op {
                LineOp::Context => ' ',
                LineOp::Remove => '-',
                LineOp::Add => '+',
            };
            out.push(format!("{sign}{}", line.text));
        }
    }
    out.join("\n")
}

fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}
