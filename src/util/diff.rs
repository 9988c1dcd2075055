use similar::TextDiff;
use thiserror::Error;

/// Error parsing unified diff text
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DiffParseError {
    #[error("malformed hunk header: {0}")]
    MalformedHeader(String),
    #[error("unexpected line outside of a hunk: {0}")]
    StrayLine(String),
}

/// One hunk of a unified diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub new_start: u32,
    pub new_lines: u32,
    /// Body lines including their ` `, `-`, `+` or `\` prefix
    pub body: Vec<String>,
}

/// Line-based unified diff between `old` and `new` without context lines
pub fn unified_diff(old: &str, new: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(0)
        .header("original", "patched")
        .to_string()
}

/// Parse the hunks of a single-file unified diff. File header lines before
/// the first hunk are skipped.
pub fn parse_hunks(diff: &str) -> Result<Vec<Hunk>, DiffParseError> {
    let mut hunks: Vec<Hunk> = Vec::new();

    for line in diff.lines() {
        if line.starts_with("@@") {
            hunks.push(parse_header(line)?);
            continue;
        }

        match hunks.last_mut() {
            Some(hunk) => hunk.body.push(line.to_string()),
            None if line.starts_with("---") || line.starts_with("+++") => {}
            None => return Err(DiffParseError::StrayLine(line.to_string())),
        }
    }

    Ok(hunks)
}

/// Parse `@@ -a[,b] +c[,d] @@`
fn parse_header(line: &str) -> Result<Hunk, DiffParseError> {
    let malformed = || DiffParseError::MalformedHeader(line.to_string());

    let inner = line
        .strip_prefix("@@ ")
        .and_then(|rest| rest.split(" @@").next())
        .ok_or_else(malformed)?;
    let mut ranges = inner.split_whitespace();
    let old = ranges
        .next()
        .and_then(|r| r.strip_prefix('-'))
        .ok_or_else(malformed)?;
    let new = ranges
        .next()
        .and_then(|r| r.strip_prefix('+'))
        .ok_or_else(malformed)?;

    parse_range(old).ok_or_else(malformed)?;
    let (new_start, new_lines) = parse_range(new).ok_or_else(malformed)?;

    Ok(Hunk {
        new_start,
        new_lines,
        body: Vec::new(),
    })
}

/// `start` alone means a single line
fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}
