//! Parsing of `git status` and `git rev-list` output

use crate::driver::FileStatus;

/// Parse `git status --porcelain` (v1) output
///
/// The first two columns are the status code, the path starts at column
/// four. Lines too short to carry a path are ignored.
pub(crate) fn parse_porcelain(output: &str) -> Vec<FileStatus> {
    output
        .lines()
        .filter(|line| line.len() > 3)
        .filter_map(|line| {
            let code = line.get(..2)?;
            let path = line.get(3..)?;
            Some(FileStatus {
                path: path.to_string(),
                code: code.to_string(),
            })
        })
        .collect()
}

/// Parse `git rev-list --left-right --count @{upstream}...HEAD`
///
/// The output is "behind ahead". Returns `(ahead, behind)`, or `(0, 0)`
/// when the output is not two counts.
pub(crate) fn parse_ahead_behind(output: &str) -> (usize, usize) {
    let mut counts = output.split_whitespace().map(str::parse::<usize>);
    match (counts.next(), counts.next(), counts.next()) {
        (Some(Ok(behind)), Some(Ok(ahead)), None) => (ahead, behind),
        _ => (0, 0),
    }
}
