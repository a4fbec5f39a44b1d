//! Filename heuristics: conflict artifacts, editor temp files and the
//! suffixes merge tools bolt onto a file when they give up.

use regex::{Regex, RegexSet};
use std::sync::LazyLock;

const CONFLICT_PATTERNS: &[&str] = &[
    r"\.BASE\.",
    r"\.LOCAL\.",
    r"\.REMOTE\.",
    r"\.BACKUP\.",
    r"_BACKUP_",
    r"_BASE_",
    r"_LOCAL_",
    r"_REMOTE_",
    r"<<<<<<< ",
    r"=======",
    r">>>>>>> ",
    r"\.orig$",
    r"\.rej$",
    r"\.mine$",
    r"\.r\d+$",
    r"\.working$",
    r"\.merge-\w+$",
    r"_conflict_",
    r"_merged_",
    r"\.conflicted\.",
];

const TEMP_PATTERNS: &[&str] = &[
    r"^\.#",
    r"^#.*#$",
    r"^\..*\.swp$",
    r"^\..*\.tmp$",
    r"~$",
    r"\.bak$",
];

// Removal forms of the conflict family. Each one is anchored to its own
// suffix shape so the order they run in does not change the result.
const STRIP_PATTERNS: &[&str] = &[
    r"\.BASE\.[^.]+$",
    r"\.LOCAL\.[^.]+$",
    r"\.REMOTE\.[^.]+$",
    r"\.BACKUP\.[^.]+$",
    r"_BACKUP_\d+",
    r"_BASE_\d+",
    r"_LOCAL_\d+",
    r"_REMOTE_\d+",
    r"\.orig$",
    r"\.rej$",
    r"\.mine$",
    r"\.r\d+$",
    r"\.working$",
    r"\.merge-\w+$",
    r"_conflict_\d*",
    r"_merged_\d*",
    r"\.conflicted\.\w+$",
];

fn case_insensitive(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| format!("(?i){p}")).collect()
}

static CONFLICT_RE: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(case_insensitive(CONFLICT_PATTERNS))
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});
static TEMP_RE: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(case_insensitive(TEMP_PATTERNS)).unwrap_or_else(|_| panic!("Invalid Regex"))
});
static STRIP_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    case_insensitive(STRIP_PATTERNS)
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|_| panic!("Invalid Regex")))
        .collect()
});

/// True when the name carries a conflict marker or a tool conflict suffix.
pub fn is_conflict_file(name: &str) -> bool {
    CONFLICT_RE.is_match(name)
}

/// True for editor swap, lock and backup files.
pub fn is_temp_file(name: &str) -> bool {
    TEMP_RE.is_match(name)
}

/// Removes every recognized conflict/backup suffix from `name`.
///
/// Passes repeat until nothing changes, so stacked suffixes such as
/// `Foo.java.orig.orig` collapse fully and a second call is a no-op.
pub fn strip_merge_suffixes(name: &str) -> String {
    let mut current = name.to_string();
    loop {
        let mut next = current.clone();
        for re in STRIP_RE.iter() {
            next = re.replace_all(&next, "").into_owned();
        }
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Filename without its last extension; dotfiles keep their full name.
pub fn stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if name[..idx].chars().any(|c| c != '.') => &name[..idx],
        _ => name,
    }
}
