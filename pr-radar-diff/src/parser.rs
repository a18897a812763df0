//! Unified diff parser.
//!
//! Builds on the shape of `mr-reviewer::parser::parse_unified_diff_advanced`
//! (hunk-body folding into `DiffLine`s, tolerant of missing `---`/`+++`
//! headers) and generalizes it to full `diff --git` framing so that rename
//! and binary-file hunks (§4.1) are produced with an empty `diff_lines` body.

use crate::errors::{DiffError, DiffResult};
use crate::model::{DiffLine, GitDiff, Hunk};
use tracing::{debug, trace};

/// Parses a unified diff (standard `diff --git` / `@@` framing) into a
/// `GitDiff` tagged with `commit_hash`.
///
/// Hunks are emitted in file order, then intra-file order, per §4.1's
/// contract. Binary files and renames-without-changes produce a hunk with
/// empty `diff_lines` and `rename_from` set; no `@@` body is required for
/// those.
pub fn parse_git_diff(raw: &str, commit_hash: impl Into<String>) -> DiffResult<GitDiff> {
    let mut hunks = Vec::new();

    for block in split_file_blocks(raw) {
        parse_file_block(&block, &mut hunks)?;
    }

    Ok(GitDiff::new(commit_hash, hunks))
}

/// One `diff --git ...` section's raw lines, kept verbatim.
struct FileBlock<'a> {
    lines: Vec<&'a str>,
}

/// Splits the raw diff text into per-file blocks, each starting at a
/// `diff --git` line (or, if the input has no such framing, one block
/// covering the whole input — this keeps bare hunk-only input parseable,
/// matching the teacher parser's tolerance).
fn split_file_blocks(raw: &str) -> Vec<FileBlock<'_>> {
    let mut blocks: Vec<FileBlock<'_>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw.lines() {
        if line.starts_with("diff --git ") {
            if !current.is_empty() {
                blocks.push(FileBlock { lines: current });
            }
            current = vec![line];
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(FileBlock { lines: current });
    }
    blocks
}

fn parse_file_block(block: &FileBlock<'_>, hunks: &mut Vec<Hunk>) -> DiffResult<()> {
    let mut old_path: Option<String> = None;
    let mut new_path: Option<String> = None;
    let mut rename_from: Option<String> = None;
    let mut is_binary = false;
    let mut produced_any_hunk = false;

    let mut idx = 0usize;
    let lines = &block.lines;

    // Best-effort extraction of a/b paths from the `diff --git a/X b/Y` line,
    // used as a fallback when no `---`/`+++`/`rename` lines are present.
    if let Some(first) = lines.first() {
        if let Some(rest) = first.strip_prefix("diff --git ") {
            if let Some((a, b)) = split_ab_paths(rest) {
                old_path = Some(a);
                new_path = Some(b);
            }
        }
        idx = 1;
    }

    while idx < lines.len() {
        let line = lines[idx];

        if let Some(rest) = line.strip_prefix("rename from ") {
            rename_from = Some(rest.to_string());
            idx += 1;
            continue;
        }
        if let Some(rest) = line.strip_prefix("rename to ") {
            new_path = Some(rest.to_string());
            idx += 1;
            continue;
        }
        if let Some(rest) = line.strip_prefix("--- ") {
            old_path = normalize_ab_path(rest);
            idx += 1;
            continue;
        }
        if let Some(rest) = line.strip_prefix("+++ ") {
            new_path = normalize_ab_path(rest);
            idx += 1;
            continue;
        }
        if looks_like_binary_marker(line) {
            is_binary = true;
            idx += 1;
            continue;
        }
        if line.starts_with("@@") {
            let file_for_errors = new_path
                .clone()
                .or_else(|| old_path.clone())
                .unwrap_or_else(|| "<unknown>".to_string());
            let (hunk, consumed) = parse_hunk(lines, idx, &file_for_errors, new_path.as_deref())?;
            hunks.push(hunk);
            produced_any_hunk = true;
            idx += consumed;
            continue;
        }
        idx += 1;
    }

    if !produced_any_hunk && (rename_from.is_some() || is_binary) {
        let file_path = new_path.or(old_path).unwrap_or_default();
        debug!(file = %file_path, rename = rename_from.is_some(), binary = is_binary, "empty hunk (rename/binary)");
        hunks.push(Hunk {
            file_path,
            rename_from,
            old_start: 0,
            old_length: 0,
            new_start: 0,
            new_length: 0,
            diff_lines: Vec::new(),
        });
    }

    Ok(())
}

fn looks_like_binary_marker(line: &str) -> bool {
    line.starts_with("GIT binary patch")
        || line.starts_with("Binary files ")
        || (line.starts_with("Files ") && line.contains(" differ"))
}

/// Splits `a/foo.rs b/bar.rs` into `("foo.rs", "bar.rs")`, stripping the
/// leading `a/`/`b/` convention. Returns `None` if the shape is unexpected
/// (e.g. paths containing spaces without quoting) — callers fall back to
/// `---`/`+++`/`rename` lines in that case.
fn split_ab_paths(rest: &str) -> Option<(String, String)> {
    let rest = rest.trim();
    // Heuristic: find " b/" after the leading "a/" prefix.
    let rest = rest.strip_prefix("a/").unwrap_or(rest);
    let marker = " b/";
    let pos = rest.find(marker)?;
    let a = rest[..pos].to_string();
    let b = rest[pos + marker.len()..].to_string();
    Some((a, b))
}

/// Strips the `a/`/`b/` prefix and the `\t`-trailing timestamp some diff
/// producers append to `---`/`+++` lines. Returns `None` for `/dev/null`.
fn normalize_ab_path(rest: &str) -> Option<String> {
    let rest = rest.split('\t').next().unwrap_or(rest).trim();
    if rest == "/dev/null" {
        return None;
    }
    let stripped = rest.strip_prefix("a/").or_else(|| rest.strip_prefix("b/"));
    Some(stripped.unwrap_or(rest).to_string())
}

/// Parses one `@@ -old_start,old_length +new_start,new_length @@` hunk
/// starting at `lines[start]`, folding body lines until the next `@@` or
/// `diff --git` line. Returns the hunk and the number of lines consumed.
fn parse_hunk(
    lines: &[&str],
    start: usize,
    file_for_errors: &str,
    file_path: Option<&str>,
) -> DiffResult<(Hunk, usize)> {
    let header = lines[start];
    let (old_start, old_length, new_start, new_length) = parse_hunk_header(header, file_for_errors)?;

    let mut diff_lines = Vec::new();
    let mut old_line = old_start;
    let mut new_line = new_start;
    let mut idx = start + 1;

    while idx < lines.len() {
        let line = lines[idx];
        if line.starts_with("@@") || line.starts_with("diff --git ") {
            break;
        }
        if let Some(rest) = line.strip_prefix("\\ ") {
            trace!(marker = rest, "ignoring no-newline marker");
            idx += 1;
            continue;
        }
        if let Some(rest) = line.strip_prefix('+') {
            diff_lines.push(DiffLine::added(new_line, rest.to_string()));
            new_line += 1;
        } else if let Some(rest) = line.strip_prefix('-') {
            diff_lines.push(DiffLine::removed(old_line, rest.to_string()));
            old_line += 1;
        } else if let Some(rest) = line.strip_prefix(' ') {
            diff_lines.push(DiffLine::context(old_line, new_line, rest.to_string()));
            old_line += 1;
            new_line += 1;
        } else if line.is_empty() {
            // A body line that is just an empty context line (some diff
            // producers drop the single leading space on blank lines).
            diff_lines.push(DiffLine::context(old_line, new_line, String::new()));
            old_line += 1;
            new_line += 1;
        } else {
            // Unexpected prefix: treat as context, matching the teacher
            // parser's tolerant fallback.
            diff_lines.push(DiffLine::context(old_line, new_line, line.to_string()));
            old_line += 1;
            new_line += 1;
        }
        idx += 1;
    }

    let hunk = Hunk {
        file_path: file_path.unwrap_or(file_for_errors).to_string(),
        rename_from: None,
        old_start,
        old_length,
        new_start,
        new_length,
        diff_lines,
    };

    Ok((hunk, idx - start))
}

/// Parses `@@ -old_start,old_length +new_start,new_length @@ optional-name`.
/// Missing length defaults to 1 (spec §4.1).
fn parse_hunk_header(header: &str, file: &str) -> DiffResult<(u32, u32, u32, u32)> {
    let inner = header
        .trim_start_matches('@')
        .trim_end()
        .split("@@")
        .next()
        .unwrap_or("")
        .trim();

    let (left, right) = inner
        .split_once('+')
        .ok_or_else(|| DiffError::MalformedHunkHeader {
            file: file.to_string(),
            line_offset: 0,
            reason: format!("missing '+' side in header: {header:?}"),
        })?;

    let left_nums = left.trim().trim_start_matches('-');
    let right_nums = right.trim();

    let (old_start, old_length) = split_nums(left_nums, file)?;
    let (new_start, new_length) = split_nums(right_nums, file)?;

    Ok((
        old_start,
        old_length.unwrap_or(1),
        new_start,
        new_length.unwrap_or(1),
    ))
}

/// Splits `"12,7"` or `"12"` into `(start, len)`. A bare `"12"` (no comma)
/// means the length field was omitted, which defaults to `1` (spec §4.1);
/// an explicit `"12,0"` (e.g. `@@ -0,0 +1,40 @@` for a brand-new file)
/// must stay `0`, so the two cases are distinguished with `Option` rather
/// than collapsing "missing" and "explicitly zero" into the same sentinel.
fn split_nums(s: &str, file: &str) -> DiffResult<(u32, Option<u32>)> {
    let s = s.trim();
    if let Some((a, b)) = s.split_once(',') {
        let start = a
            .parse::<u32>()
            .map_err(|_| DiffError::InvalidInteger {
                file: file.to_string(),
                value: a.to_string(),
            })?;
        let len = b.parse::<u32>().map_err(|_| DiffError::InvalidInteger {
            file: file.to_string(),
            value: b.to_string(),
        })?;
        Ok((start, Some(len)))
    } else {
        let start = s.parse::<u32>().map_err(|_| DiffError::InvalidInteger {
            file: file.to_string(),
            value: s.to_string(),
        })?;
        Ok((start, None))
    }
}
