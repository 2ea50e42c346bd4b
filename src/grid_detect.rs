use std::collections::HashMap;

use crate::model::{PageText, RawGrid};

pub(crate) const LOW_CONFIDENCE_THRESHOLD: f32 = 0.60;

/// Splits a text line into cells on tabs and runs of two or more spaces.
/// Single spaces stay inside a cell so multi-word values survive.
pub(crate) fn split_line_into_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut whitespace_run = 0_usize;

    for ch in trimmed.chars() {
        if ch == '\t' {
            if !current.trim().is_empty() {
                cells.push(current.trim().to_string());
                current.clear();
            }
            whitespace_run = 0;
            continue;
        }

        if ch.is_whitespace() {
            whitespace_run += 1;
            if whitespace_run >= 2 {
                if !current.trim().is_empty() {
                    cells.push(current.trim().to_string());
                    current.clear();
                }
                continue;
            }
            current.push(' ');
            continue;
        }

        whitespace_run = 0;
        current.push(ch);
    }

    if !current.trim().is_empty() {
        cells.push(current.trim().to_string());
    }

    cells
}

pub(crate) fn soft_split_line_into_cells(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Most frequent row length, ties broken toward the wider count.
pub(crate) fn modal_width(rows: &[Vec<String>]) -> usize {
    let mut freq = HashMap::new();
    for width in rows.iter().map(Vec::len) {
        *freq.entry(width).or_insert(0_usize) += 1;
    }

    freq.into_iter()
        .max_by_key(|(width, count)| (*count, *width))
        .map_or(0, |(width, _)| width)
}

fn grid_confidence(rows: &[Vec<String>]) -> f32 {
    if rows.len() < 2 {
        return 0.0;
    }

    let modal = modal_width(rows);
    if modal == 0 {
        return 0.0;
    }

    let consistent =
        rows.iter().filter(|row| row.len() == modal).count() as f32 / rows.len() as f32;
    let max_width = rows.iter().map(Vec::len).max().unwrap_or(modal);
    let min_width = rows.iter().map(Vec::len).min().unwrap_or(modal);
    let uniformity = if max_width == 0 {
        0.0
    } else {
        1.0 - ((max_width - min_width) as f32 / max_width as f32)
    };

    (consistent * 0.75 + uniformity * 0.25).clamp(0.0, 1.0)
}

fn detect_grids_in_page(page: &PageText, min_cols: usize) -> Vec<RawGrid> {
    let mut grids = Vec::new();
    let mut current_rows: Vec<Vec<String>> = Vec::new();

    let flush_current = |rows: &mut Vec<Vec<String>>, grids: &mut Vec<RawGrid>| {
        if rows.len() >= 2 {
            let confidence = grid_confidence(rows);
            grids.push(RawGrid {
                page: page.page_number,
                rows: std::mem::take(rows),
                confidence,
            });
        } else {
            rows.clear();
        }
    };

    for line in page.text.lines() {
        let mut cells = split_line_into_cells(line);
        if cells.len() < min_cols {
            let soft_cells = soft_split_line_into_cells(line);
            let has_numeric = soft_cells
                .iter()
                .any(|cell| cell.chars().any(|ch| ch.is_ascii_digit()));
            let looks_like_sentence = ['.', '!', '?']
                .iter()
                .any(|punctuation| line.trim_end().ends_with(*punctuation));
            if soft_cells.len() >= min_cols
                && !looks_like_sentence
                && (has_numeric || soft_cells.len() <= 6)
            {
                cells = soft_cells;
            }
        }

        if cells.len() >= min_cols {
            current_rows.push(cells);
        } else {
            flush_current(&mut current_rows, &mut grids);
        }
    }

    flush_current(&mut current_rows, &mut grids);
    grids
}

/// Detects candidate grids across all selected pages, in document order.
pub(crate) fn detect_grids(pages: &[PageText], min_cols: usize) -> Vec<RawGrid> {
    let mut grids = Vec::new();
    for page in pages {
        grids.extend(detect_grids_in_page(page, min_cols.max(2)));
    }
    grids
}
