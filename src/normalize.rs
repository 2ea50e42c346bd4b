use crate::grid_detect::modal_width;
use crate::model::{NormalizedGrid, RawGrid};
use crate::options::HeaderPolicy;
use crate::warning::{ExtractWarning, WarningCode};

const HEADER_INFERENCE_MIN_CONFIDENCE: f32 = 0.55;

/// Treats `1.234,56` and `22,90` style values as numeric alongside plain
/// digit strings.
fn is_numeric_like(value: &str) -> bool {
    let trimmed = value.trim().replace('.', "").replace(',', ".");
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
}

fn non_numeric_ratio(cells: &[String]) -> f32 {
    if cells.is_empty() {
        return 0.0;
    }

    let non_numeric = cells.iter().filter(|cell| !is_numeric_like(cell)).count();
    non_numeric as f32 / cells.len() as f32
}

/// Header heuristic for `HeaderPolicy::Auto`: a mostly non-numeric first
/// row over a numeric-leaning second row reads as a header.
pub(crate) fn infer_has_header(rows: &[Vec<String>]) -> (bool, f32) {
    if rows.is_empty() {
        return (false, 0.0);
    }

    let first = non_numeric_ratio(&rows[0]);
    let second = rows.get(1).map_or(0.0, |row| non_numeric_ratio(row));

    let confidence = (first * 0.6 + (1.0 - second) * 0.4).clamp(0.0, 1.0);
    let has_header = first >= 0.6 && second <= 0.7;
    (has_header, confidence)
}

fn apply_header_policy(
    rows: Vec<Vec<String>>,
    policy: HeaderPolicy,
    page: u32,
    fragment_id: usize,
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<Vec<String>> {
    match policy {
        HeaderPolicy::StripFirst => rows.into_iter().skip(1).collect(),
        HeaderPolicy::Keep => rows,
        HeaderPolicy::Auto => {
            let (has_header, confidence) = infer_has_header(&rows);
            if has_header && confidence >= HEADER_INFERENCE_MIN_CONFIDENCE {
                return rows.into_iter().skip(1).collect();
            }

            if confidence < HEADER_INFERENCE_MIN_CONFIDENCE {
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::HeaderInferenceLowConfidence,
                        "header inference confidence is low; keeping the first row as data",
                    )
                    .with_page(page)
                    .with_fragment_id(fragment_id)
                    .with_confidence(confidence),
                );
            }

            rows
        }
    }
}

/// Normalizes one raw grid: fixes the column count to the modal row length,
/// applies the header policy, drops blank rows, and pads or truncates every
/// remaining row to the fixed width. Returns `None` when nothing survives;
/// such fragments are excluded from the merge.
pub(crate) fn normalize_grid(
    grid: &RawGrid,
    policy: HeaderPolicy,
    fragment_id: usize,
    warnings: &mut Vec<ExtractWarning>,
) -> Option<NormalizedGrid> {
    let trimmed: Vec<Vec<String>> = grid
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.trim().to_string()).collect())
        .collect();

    let width = modal_width(&trimmed);
    if width == 0 {
        return None;
    }

    let rows: Vec<Vec<String>> = apply_header_policy(trimmed, policy, grid.page, fragment_id, warnings)
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|mut row| {
            row.resize(width, String::new());
            row
        })
        .collect();

    if rows.is_empty() {
        return None;
    }

    Some(NormalizedGrid {
        page: grid.page,
        width,
        rows,
    })
}
