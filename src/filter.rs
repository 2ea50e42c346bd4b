use crate::model::{ColumnKey, FilteredView, MergedTable, SemanticRole};

/// Sentinel cost-center value meaning "no constraint", as used by choice
/// controls that prepend an all-rows entry.
pub const COST_CENTER_ALL: &str = "all";

/// Active filter parameters. `None` means the dimension is unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterParams {
    pub query: Option<String>,
    pub cost_center: Option<String>,
}

impl FilterParams {
    /// Normalizes raw surface inputs: blank queries and the `all` sentinel
    /// (case-insensitive) both mean "no constraint".
    #[must_use]
    pub fn new(query: Option<&str>, cost_center: Option<&str>) -> Self {
        let query = query
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let cost_center = cost_center
            .map(str::trim)
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case(COST_CENTER_ALL))
            .map(str::to_string);
        Self { query, cost_center }
    }

    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.query.is_none() && self.cost_center.is_none()
    }
}

fn row_contains(row: &[String], needle_lower: &str) -> bool {
    row.iter()
        .any(|value| value.to_lowercase().contains(needle_lower))
}

/// Computes a fresh view of the rows satisfying both filters (logical AND).
/// The text filter is a case-insensitive substring match against every
/// value in the row; the cost-center filter is exact equality against the
/// inferred cost-center column and is inert when no such column exists.
/// The source table is never mutated.
#[must_use]
pub fn filter_table(table: &MergedTable, params: &FilterParams) -> FilteredView {
    let needle = params.query.as_deref().map(str::to_lowercase);
    let cost_center_index = table.column_index(ColumnKey::Role(SemanticRole::CostCenter));

    let rows = table
        .rows
        .iter()
        .filter(|row| {
            needle
                .as_deref()
                .is_none_or(|needle| row_contains(row, needle))
        })
        .filter(|row| {
            params.cost_center.as_deref().is_none_or(|wanted| {
                cost_center_index.is_none_or(|index| row[index] == wanted)
            })
        })
        .cloned()
        .collect();

    FilteredView {
        columns: table.columns.clone(),
        rows,
    }
}

/// Distinct, sorted, non-empty cost-center values for populating a choice
/// control. Empty when no cost-center column was inferred — callers surface
/// the missing dimension from that.
#[must_use]
pub fn distinct_cost_centers(table: &MergedTable) -> Vec<String> {
    let Some(index) = table.column_index(ColumnKey::Role(SemanticRole::CostCenter)) else {
        return Vec::new();
    };

    let mut values: Vec<String> = table
        .rows
        .iter()
        .map(|row| row[index].clone())
        .filter(|value| !value.trim().is_empty())
        .collect();
    values.sort();
    values.dedup();
    values
}

#[cfg(test)]
mod tests {
    use super::{COST_CENTER_ALL, FilterParams, distinct_cost_centers, filter_table};
    use crate::model::{ColumnKey, MergedTable, SemanticRole};

    fn table() -> MergedTable {
        let columns = vec![
            ColumnKey::Role(SemanticRole::Code),
            ColumnKey::Role(SemanticRole::Description),
            ColumnKey::Role(SemanticRole::CostCenter),
        ];
        let rows = vec![
            vec![
                "001.002.003".to_string(),
                "CANETA ESFEROGRAFICA AZUL".to_string(),
                "CC 01".to_string(),
            ],
            vec![
                "001.002.004".to_string(),
                "PAPEL SULFITE A4".to_string(),
                "CC 02".to_string(),
            ],
            vec![
                "001.002.005".to_string(),
                "CANETA MARCA-TEXTO".to_string(),
                "CC 01".to_string(),
            ],
        ];
        MergedTable {
            columns,
            row_count: rows.len(),
            fragment_count: 1,
            rows,
        }
    }

    #[test]
    fn text_filter_is_case_insensitive_substring_over_all_columns() {
        let view = filter_table(&table(), &FilterParams::new(Some("caneta"), None));
        assert_eq!(view.rows.len(), 2);

        let view = filter_table(&table(), &FilterParams::new(Some("005"), None));
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0][0], "001.002.005");
    }

    #[test]
    fn blank_query_and_all_sentinel_are_unconstrained() {
        assert!(FilterParams::new(Some("   "), Some("ALL")).is_unconstrained());
        assert!(FilterParams::new(None, Some(COST_CENTER_ALL)).is_unconstrained());

        let view = filter_table(&table(), &FilterParams::default());
        assert_eq!(view.rows.len(), 3);
    }

    #[test]
    fn cost_center_filter_is_exact_equality() {
        let view = filter_table(&table(), &FilterParams::new(None, Some("CC 01")));
        assert_eq!(view.rows.len(), 2);

        // Substrings do not match.
        let view = filter_table(&table(), &FilterParams::new(None, Some("CC 0")));
        assert!(view.rows.is_empty());
    }

    #[test]
    fn filters_compose_with_logical_and_in_either_order() {
        let source = table();
        let both = filter_table(&source, &FilterParams::new(Some("caneta"), Some("CC 01")));

        let text_first = filter_table(&source, &FilterParams::new(Some("caneta"), None));
        let text_first = MergedTable {
            columns: text_first.columns,
            row_count: text_first.rows.len(),
            fragment_count: source.fragment_count,
            rows: text_first.rows,
        };
        let then_cost = filter_table(&text_first, &FilterParams::new(None, Some("CC 01")));

        assert_eq!(both.rows, then_cost.rows);
        assert_eq!(both.rows.len(), 2);
    }

    #[test]
    fn filtering_is_idempotent() {
        let source = table();
        let params = FilterParams::new(Some("caneta"), Some("CC 01"));
        let once = filter_table(&source, &params);
        let roundtrip = MergedTable {
            columns: once.columns.clone(),
            row_count: once.rows.len(),
            fragment_count: source.fragment_count,
            rows: once.rows.clone(),
        };
        let twice = filter_table(&roundtrip, &params);
        assert_eq!(once.rows, twice.rows);
    }

    #[test]
    fn cost_center_filter_is_inert_without_the_column() {
        let mut source = table();
        source.columns.truncate(2);
        for row in &mut source.rows {
            row.truncate(2);
        }

        let view = filter_table(&source, &FilterParams::new(None, Some("CC 01")));
        assert_eq!(view.rows.len(), 3);
        assert!(distinct_cost_centers(&source).is_empty());
    }

    #[test]
    fn distinct_cost_centers_are_sorted_and_deduplicated() {
        assert_eq!(distinct_cost_centers(&table()), vec!["CC 01", "CC 02"]);
    }

    #[test]
    fn source_table_is_untouched_by_filtering() {
        let source = table();
        let before = source.clone();
        let _ = filter_table(&source, &FilterParams::new(Some("caneta"), Some("CC 01")));
        assert_eq!(source, before);
    }
}
