mod classify;
mod csv_out;
mod error;
mod fetch;
mod filter;
mod grid_detect;
mod merge;
mod model;
mod normalize;
mod options;
mod pdf_reader;
pub mod server;
mod warning;

use std::path::Path;

use crate::grid_detect::LOW_CONFIDENCE_THRESHOLD;

pub use error::ExtractError;
pub use fetch::fetch_document;
pub use filter::{COST_CENTER_ALL, FilterParams, distinct_cost_centers, filter_table};
pub use model::{
    ClassifiedFragment, ColumnKey, FilteredView, MergedTable, NormalizedGrid, PageText, RawGrid,
    SemanticRole,
};
pub use options::{
    ClassifierConfig, DEFAULT_DESCRIPTION_MEAN_LEN, DEFAULT_UNIT_PRICE_COMMA_THRESHOLD,
    DEFAULT_UNIT_TOKENS, ExtractOptions, HeaderPolicy, PageSelection, QualityMode,
};
pub use warning::{ExtractWarning, WarningCode};

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub row_count: usize,
    pub fragment_count: usize,
    pub warnings: Vec<ExtractWarning>,
}

fn apply_quality_mode(
    grids: Vec<RawGrid>,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<Vec<RawGrid>, ExtractError> {
    let mut out = Vec::new();

    for grid in grids {
        if grid.confidence >= LOW_CONFIDENCE_THRESHOLD {
            out.push(grid);
            continue;
        }

        match options.quality_mode {
            QualityMode::BestEffort => {
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::LowConfidence,
                        "grid confidence is low; kept in best-effort mode",
                    )
                    .with_page(grid.page)
                    .with_confidence(grid.confidence),
                );
                out.push(grid);
            }
            QualityMode::Strict => {
                return Err(ExtractError::AmbiguousGrid {
                    page: grid.page,
                    confidence: grid.confidence,
                });
            }
            QualityMode::SkipAmbiguous => {
                warnings.push(
                    ExtractWarning::new(WarningCode::LowConfidence, "skipping low-confidence grid")
                        .with_page(grid.page)
                        .with_confidence(grid.confidence),
                );
            }
        }
    }

    Ok(out)
}

/// Consolidates raw grids into one merged table: per-grid normalization,
/// per-fragment column classification, then role-keyed concatenation.
///
/// This is the entry point for callers that run their own table detection
/// and only need the schema-inference half of the pipeline. Grids that come
/// out empty after normalization are excluded from the merge.
#[must_use]
pub fn consolidate_grids(
    grids: &[RawGrid],
    options: &ExtractOptions,
) -> (MergedTable, Vec<ExtractWarning>) {
    let mut warnings = Vec::new();
    let mut fragments = Vec::new();

    for (index, grid) in grids.iter().enumerate() {
        let fragment_id = index + 1;
        let Some(normalized) =
            normalize::normalize_grid(grid, options.header_policy, fragment_id, &mut warnings)
        else {
            tracing::debug!(page = grid.page, fragment_id, "fragment empty after normalization");
            continue;
        };

        let fragment = classify::classify_fragment(normalized, &options.classifier);
        let unlabeled = fragment
            .roles
            .iter()
            .filter(|role| **role == SemanticRole::Unlabeled)
            .count();
        if unlabeled > 0 {
            warnings.push(
                ExtractWarning::new(
                    WarningCode::UnlabeledColumns,
                    format!("{unlabeled} column(s) matched no role predicate"),
                )
                .with_page(fragment.grid.page)
                .with_fragment_id(fragment_id),
            );
        }
        fragments.push(fragment);
    }

    if fragments.is_empty() {
        warnings.push(ExtractWarning::new(
            WarningCode::NoTablesDetected,
            "no table rows were detected in the selected pages",
        ));
    }

    let merged = merge::merge_fragments(&fragments);
    tracing::debug!(
        rows = merged.row_count,
        fragments = merged.fragment_count,
        columns = merged.columns.len(),
        "consolidated grids"
    );
    (merged, warnings)
}

fn extract_from_pages(
    pages: &[PageText],
    full_text: Option<&str>,
    options: &ExtractOptions,
) -> Result<(MergedTable, Vec<ExtractWarning>), ExtractError> {
    let mut warnings = Vec::new();

    let mut raw_grids = grid_detect::detect_grids(pages, options.min_cols);
    if raw_grids.is_empty()
        && let Some(text) = full_text.filter(|text| !text.trim().is_empty())
    {
        let fallback_pages = vec![PageText {
            page_number: 1,
            text: text.to_string(),
        }];
        let fallback_grids = grid_detect::detect_grids(&fallback_pages, options.min_cols);
        if !fallback_grids.is_empty() {
            warnings.push(ExtractWarning::new(
                WarningCode::DocumentLevelFallback,
                "no page-level grids detected; retried with document-level text extraction",
            ));
            raw_grids = fallback_grids;
        }
    }

    let kept = apply_quality_mode(raw_grids, options, &mut warnings)?;
    let (merged, mut consolidation_warnings) = consolidate_grids(&kept, options);
    warnings.append(&mut consolidation_warnings);

    Ok((merged, warnings))
}

fn validate_options(options: &ExtractOptions) -> Result<(), ExtractError> {
    if options.min_cols < 2 {
        return Err(ExtractError::InvalidOption(
            "min_cols must be at least 2".to_string(),
        ));
    }
    Ok(())
}

pub fn extract_tables_from_path(
    input_pdf: &Path,
    options: &ExtractOptions,
) -> Result<(MergedTable, ExtractionReport), ExtractError> {
    validate_options(options)?;

    let pages = pdf_reader::read_pdf_pages(input_pdf, options.pages.as_ref())?;
    let full_text = pdf_extract::extract_text(input_pdf).ok();
    let (merged, warnings) = extract_from_pages(&pages, full_text.as_deref(), options)?;

    let report = ExtractionReport {
        row_count: merged.row_count,
        fragment_count: merged.fragment_count,
        warnings,
    };
    Ok((merged, report))
}

pub fn extract_tables_from_bytes(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<(MergedTable, ExtractionReport), ExtractError> {
    validate_options(options)?;

    let pages = pdf_reader::read_pdf_pages_from_bytes(input_pdf, options.pages.as_ref())?;
    let full_text = pdf_extract::extract_text_from_mem(input_pdf).ok();
    let (merged, warnings) = extract_from_pages(&pages, full_text.as_deref(), options)?;

    let report = ExtractionReport {
        row_count: merged.row_count,
        fragment_count: merged.fragment_count,
        warnings,
    };
    Ok((merged, report))
}

pub fn extract_pdf_to_csv(
    input_pdf: &Path,
    output_csv: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    let (merged, report) = extract_tables_from_path(input_pdf, options)?;
    csv_out::write_csv(
        output_csv,
        &merged.header_labels(),
        &merged.rows,
        options.delimiter,
    )?;
    Ok(report)
}

pub fn extract_pdf_bytes_to_csv_string(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<(String, ExtractionReport), ExtractError> {
    let (merged, report) = extract_tables_from_bytes(input_pdf, options)?;
    let csv = csv_out::write_csv_to_string(&merged.header_labels(), &merged.rows, options.delimiter)?;
    Ok((csv, report))
}

pub fn table_to_csv_string(table: &MergedTable, delimiter: u8) -> Result<String, ExtractError> {
    csv_out::write_csv_to_string(&table.header_labels(), &table.rows, delimiter)
}

pub fn view_to_csv_string(view: &FilteredView, delimiter: u8) -> Result<String, ExtractError> {
    csv_out::write_csv_to_string(&view.header_labels(), &view.rows, delimiter)
}

pub fn write_view_csv(
    path: &Path,
    view: &FilteredView,
    delimiter: u8,
) -> Result<(), ExtractError> {
    csv_out::write_csv(path, &view.header_labels(), &view.rows, delimiter)
}

#[cfg(test)]
mod tests {
    use super::{apply_quality_mode, consolidate_grids};
    use crate::error::ExtractError;
    use crate::model::RawGrid;
    use crate::options::{ExtractOptions, QualityMode};
    use crate::warning::WarningCode;

    fn low_confidence_grid() -> RawGrid {
        RawGrid {
            page: 2,
            rows: vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string()],
                vec!["d".to_string(), "e".to_string(), "f".to_string(), "g".to_string()],
            ],
            confidence: 0.3,
        }
    }

    #[test]
    fn best_effort_keeps_low_confidence_grids_with_a_warning() {
        let mut warnings = Vec::new();
        let kept = apply_quality_mode(
            vec![low_confidence_grid()],
            &ExtractOptions::default(),
            &mut warnings,
        )
        .expect("best effort never fails");

        assert_eq!(kept.len(), 1);
        assert!(warnings.iter().any(|w| w.code == WarningCode::LowConfidence));
    }

    #[test]
    fn skip_ambiguous_drops_low_confidence_grids() {
        let options = ExtractOptions {
            quality_mode: QualityMode::SkipAmbiguous,
            ..ExtractOptions::default()
        };

        let mut warnings = Vec::new();
        let kept = apply_quality_mode(vec![low_confidence_grid()], &options, &mut warnings)
            .expect("skip mode never fails");
        assert!(kept.is_empty());
        assert!(warnings.iter().any(|w| w.code == WarningCode::LowConfidence));
    }

    #[test]
    fn strict_mode_fails_on_low_confidence_grids() {
        let options = ExtractOptions {
            quality_mode: QualityMode::Strict,
            ..ExtractOptions::default()
        };

        let mut warnings = Vec::new();
        let error = apply_quality_mode(vec![low_confidence_grid()], &options, &mut warnings)
            .expect_err("strict mode should fail");
        assert!(matches!(error, ExtractError::AmbiguousGrid { page: 2, .. }));
    }

    #[test]
    fn zero_grids_consolidate_to_an_empty_table_with_a_warning() {
        let (merged, warnings) = consolidate_grids(&[], &ExtractOptions::default());
        assert!(merged.is_empty());
        assert!(
            warnings
                .iter()
                .any(|w| w.code == WarningCode::NoTablesDetected)
        );
    }
}
