//! Split `<case>.<stream...>.<variable>.<start>-<end>.<ext>` into fields.
//!
//! The stream part may itself contain `.`, so its extent is fixed by the
//! position of the one token holding a `-`: the date range. The token just
//! before it is the variable.

use crate::error::FileNameError;

pub const SEPARATOR: char = '.';
pub const RANGE_DELIMITER: char = '-';

/// Fields recovered from one time-series filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub stream:     String,
    pub variable:   String,
    pub start_date: String,
    pub end_date:   String,
}

/// Parse `name` (a bare file name, no directories) written by case `case`.
///
/// Dates are returned exactly as they appear in the name.
pub fn parse_file_name(name: &str, case: &str) -> Result<ParsedName, FileNameError> {
    let rest = name
        .strip_prefix(case)
        .and_then(|r| r.strip_prefix(SEPARATOR))
        .ok_or_else(|| FileNameError::MissingCasePrefix {
            name: name.to_string(),
            case: case.to_string(),
        })?;

    let tokens: Vec<&str> = rest.split(SEPARATOR).collect();
    let Some((_ext, body)) = tokens.split_last().filter(|(_, body)| !body.is_empty()) else {
        return Err(FileNameError::MissingExtension(name.to_string()));
    };

    let candidates: Vec<usize> = body
        .iter()
        .enumerate()
        .filter(|(_, t)| t.contains(RANGE_DELIMITER))
        .map(|(i, _)| i)
        .collect();
    let date_ind = match candidates.as_slice() {
        []  => return Err(FileNameError::NoDateRange(name.to_string())),
        [i] => *i,
        many => {
            return Err(FileNameError::AmbiguousDateRange {
                name:  name.to_string(),
                count: many.len(),
            })
        }
    };

    let token = body[date_ind];
    let (start, end) = token
        .split_once(RANGE_DELIMITER)
        .filter(|(s, e)| !s.is_empty() && !e.is_empty() && !e.contains(RANGE_DELIMITER))
        .ok_or_else(|| FileNameError::MalformedDateRange {
            name:  name.to_string(),
            token: token.to_string(),
        })?;

    let variable = match date_ind.checked_sub(1).map(|i| body[i]) {
        Some(v) if !v.is_empty() => v,
        _ => return Err(FileNameError::MissingVariable(name.to_string())),
    };

    let stream = body[..date_ind - 1].join(".");
    if stream.is_empty() {
        return Err(FileNameError::MissingStream(name.to_string()));
    }

    Ok(ParsedName {
        stream,
        variable:   variable.to_string(),
        start_date: start.to_string(),
        end_date:   end.to_string(),
    })
}
