use std::collections::{BTreeSet, HashSet};

use crate::model::{ClassifiedFragment, ColumnKey, MergedTable, SemanticRole};

/// Per-fragment column keys. The first column carrying a given role owns the
/// role key; duplicate-role columns and unlabeled columns keep their 1-based
/// positional label so no cell is dropped.
fn assign_keys(roles: &[SemanticRole]) -> Vec<ColumnKey> {
    let mut seen = HashSet::new();
    roles
        .iter()
        .enumerate()
        .map(|(index, role)| {
            if *role != SemanticRole::Unlabeled && seen.insert(*role) {
                ColumnKey::Role(*role)
            } else {
                ColumnKey::Position(index + 1)
            }
        })
        .collect()
}

/// Concatenates classified fragments into one table, projecting every row
/// into the union column space. Fragment order and within-fragment row order
/// are preserved; keys absent from a fragment contribute empty cells. No row
/// is deduplicated: `rows(merged) == sum(rows(fragments))`.
pub(crate) fn merge_fragments(fragments: &[ClassifiedFragment]) -> MergedTable {
    if fragments.is_empty() {
        return MergedTable::empty();
    }

    let fragment_keys: Vec<Vec<ColumnKey>> = fragments
        .iter()
        .map(|fragment| assign_keys(&fragment.roles))
        .collect();

    let mut positions = BTreeSet::new();
    for keys in &fragment_keys {
        for key in keys {
            if let ColumnKey::Position(index) = key {
                positions.insert(*index);
            }
        }
    }

    let mut columns = Vec::new();
    for role in SemanticRole::TAXONOMY {
        let key = ColumnKey::Role(role);
        if fragment_keys.iter().any(|keys| keys.contains(&key)) {
            columns.push(key);
        }
    }
    columns.extend(positions.into_iter().map(ColumnKey::Position));

    let mut rows = Vec::new();
    for (fragment, keys) in fragments.iter().zip(&fragment_keys) {
        for row in &fragment.grid.rows {
            let projected = columns
                .iter()
                .map(|column| {
                    keys.iter()
                        .position(|key| key == column)
                        .map_or_else(String::new, |index| row[index].clone())
                })
                .collect();
            rows.push(projected);
        }
    }

    MergedTable {
        columns,
        row_count: rows.len(),
        fragment_count: fragments.len(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::merge_fragments;
    use crate::model::{ClassifiedFragment, ColumnKey, NormalizedGrid, SemanticRole};

    fn fragment(page: u32, roles: Vec<SemanticRole>, rows: Vec<Vec<&str>>) -> ClassifiedFragment {
        let width = roles.len();
        ClassifiedFragment {
            grid: NormalizedGrid {
                page,
                width,
                rows: rows
                    .into_iter()
                    .map(|row| row.into_iter().map(ToString::to_string).collect())
                    .collect(),
            },
            roles,
        }
    }

    #[test]
    fn empty_input_yields_empty_table() {
        let merged = merge_fragments(&[]);
        assert!(merged.is_empty());
        assert!(merged.columns.is_empty());
        assert_eq!(merged.fragment_count, 0);
    }

    #[test]
    fn row_count_is_the_sum_over_fragments() {
        let a = fragment(
            1,
            vec![SemanticRole::Code, SemanticRole::Quantity],
            vec![vec!["001.002.003", "10"], vec!["001.002.004", "3"]],
        );
        let b = fragment(
            2,
            vec![SemanticRole::Code, SemanticRole::Quantity],
            vec![vec!["001.002.005", "7"]],
        );

        let merged = merge_fragments(&[a, b]);
        assert_eq!(merged.row_count, 3);
        assert_eq!(merged.rows.len(), 3);
        // Page order then row order.
        assert_eq!(merged.rows[2][0], "001.002.005");
    }

    #[test]
    fn union_columns_fill_missing_roles_with_empty_cells() {
        let a = fragment(
            1,
            vec![SemanticRole::Code, SemanticRole::Quantity],
            vec![vec!["001.002.003", "10"]],
        );
        let b = fragment(
            2,
            vec![SemanticRole::Code, SemanticRole::CostCenter],
            vec![vec!["001.002.004", "CC 01"]],
        );

        let merged = merge_fragments(&[a, b]);
        assert_eq!(
            merged.header_labels(),
            vec!["code", "cost_center", "quantity"]
        );
        assert_eq!(merged.rows[0], vec!["001.002.003", "", "10"]);
        assert_eq!(merged.rows[1], vec!["001.002.004", "CC 01", ""]);
    }

    #[test]
    fn duplicate_roles_fall_back_to_positional_keys() {
        let a = fragment(
            1,
            vec![
                SemanticRole::Quantity,
                SemanticRole::Unit,
                SemanticRole::Quantity,
            ],
            vec![vec!["10", "UN", "5"]],
        );

        let merged = merge_fragments(&[a]);
        assert_eq!(merged.header_labels(), vec!["unit", "quantity", "col_3"]);
        let quantity = merged
            .column_index(ColumnKey::Role(SemanticRole::Quantity))
            .expect("quantity column");
        let spill = merged
            .column_index(ColumnKey::Position(3))
            .expect("positional column");
        assert_eq!(merged.rows[0][quantity], "10");
        assert_eq!(merged.rows[0][spill], "5");
    }

    #[test]
    fn unlabeled_columns_keep_positional_labels() {
        let a = fragment(
            1,
            vec![SemanticRole::Unlabeled, SemanticRole::Code],
            vec![vec!["??", "001.002.003"]],
        );

        let merged = merge_fragments(&[a]);
        assert_eq!(merged.header_labels(), vec!["code", "col_1"]);
        assert_eq!(merged.rows[0], vec!["001.002.003", "??"]);
    }
}
