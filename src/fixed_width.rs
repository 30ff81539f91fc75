//! fixed-width text parsing with inferred column boundaries.

/// number of leading non-blank lines sampled to find column boundaries.
pub const INFER_ROWS: usize = 100;

/// half-open character ranges `[start, end)` of each field.
pub type ColumnSpan = (usize, usize);

/// finds the field boundaries of a fixed-width layout.
///
/// a character position belongs to a field when at least one sampled line has a
/// non-whitespace character there; each maximal run of such positions is one field.
pub fn detect_spans(lines: &[Vec<char>]) -> Vec<ColumnSpan> {
    let width = lines.iter().map(Vec::len).max().unwrap_or(0);
    let mut occupied = vec![false; width];
    for line in lines {
        for (slot, c) in occupied.iter_mut().zip(line) {
            if !c.is_whitespace() {
                *slot = true;
            }
        }
    }

    let mut spans = Vec::new();
    let mut start = None;
    for (pos, &used) in occupied.iter().enumerate() {
        match (used, start) {
            (true, None) => start = Some(pos),
            (false, Some(s)) => {
                spans.push((s, pos));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, width));
    }
    spans
}

/// slices one line into trimmed fields; positions past the end of the line read as empty.
pub fn split_line(line: &[char], spans: &[ColumnSpan]) -> Vec<String> {
    spans
        .iter()
        .map(|&(start, end)| {
            let end = end.min(line.len());
            let start = start.min(end);
            line[start..end].iter().collect::<String>().trim().to_string()
        })
        .collect()
}

/// splits fixed-width text into rows of trimmed fields, skipping blank lines.
pub fn parse_fixed_width(text: &str) -> Vec<Vec<String>> {
    let lines: Vec<Vec<char>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().collect())
        .collect();
    let sample = &lines[..lines.len().min(INFER_ROWS)];
    let spans = detect_spans(sample);
    lines.iter().map(|line| split_line(line, &spans)).collect()
}
