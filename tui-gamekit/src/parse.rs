use thiserror::Error;

/// Options for [`parse_index_grid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexParseOptions {
    /// Lines starting with this character are skipped.
    pub comment_char: char,
    /// Reverse row order, for data authored with the first line at the bottom.
    pub flip_rows: bool,
}

impl Default for IndexParseOptions {
    fn default() -> Self {
        Self {
            comment_char: '#',
            flip_rows: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("map data contains no rows")]
    Empty,
    #[error("line {line}: {token:?} is not a tile index")]
    InvalidIndex { line: usize, token: String },
}

/// Parses tile index rows such as
///
/// ```text
/// # floor layer
/// 0, 1, 1, -1
/// 2  2  2
/// ```
///
/// Commas and whitespace both separate values. Rows may differ in length;
/// negative values are kept and read as "no tile" by the tilemap.
pub fn parse_index_grid(text: &str, options: &IndexParseOptions) -> Result<Vec<Vec<i32>>, ParseError> {
    let mut rows = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(options.comment_char) {
            continue;
        }

        let row = trimmed
            .split(|ch: char| ch == ',' || ch.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                token.parse::<i32>().map_err(|_| ParseError::InvalidIndex {
                    line: line_no + 1,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(ParseError::Empty);
    }
    if options.flip_rows {
        rows.reverse();
    }

    log::debug!(
        "parsed {} tile rows (widest {})",
        rows.len(),
        rows.iter().map(Vec::len).max().unwrap_or(0)
    );
    Ok(rows)
}
