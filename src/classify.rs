use std::sync::LazyLock;

use regex::Regex;

use crate::model::{ClassifiedFragment, NormalizedGrid, SemanticRole};
use crate::options::ClassifierConfig;

// Item codes in procurement records follow a three-group catalog numbering
// scheme, e.g. 001.002.003.
static ITEM_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{3}\.\d{3}\.\d{3}\b").expect("hardcoded item-code regex is valid")
});

static COST_CENTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)centro\s+de\s+custo|\bCC\s*\d+").expect("hardcoded cost-center regex is valid")
});

// Digits, comma, exactly two decimal digits: 1,50 / 1.234,56.
static COMMA_DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+,\d{2}\b").expect("hardcoded comma-decimal regex is valid")
});

static PURE_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("hardcoded digits regex is valid"));

fn is_unit_token(value: &str, config: &ClassifierConfig) -> bool {
    value.split_whitespace().any(|token| {
        let upper = token.to_uppercase();
        config.unit_tokens.iter().any(|unit| *unit == upper)
    })
}

/// Assigns one role to a column by evaluating predicates in fixed priority
/// order over all of the column's values; the first match wins. More
/// specific shapes (structured codes, explicit markers) are checked before
/// generic ones (digit ratio, mean length).
fn classify_column(values: &[&str], config: &ClassifierConfig) -> SemanticRole {
    if values.is_empty() {
        return SemanticRole::Unlabeled;
    }

    if values.iter().any(|value| ITEM_CODE_RE.is_match(value)) {
        return SemanticRole::Code;
    }

    if values.iter().any(|value| COST_CENTER_RE.is_match(value)) {
        return SemanticRole::CostCenter;
    }

    if values.iter().any(|value| is_unit_token(value, config)) {
        return SemanticRole::Unit;
    }

    let digit_only = values
        .iter()
        .filter(|value| PURE_DIGITS_RE.is_match(value))
        .count();
    if digit_only * 2 > values.len() {
        return SemanticRole::Quantity;
    }

    if values.iter().any(|value| COMMA_DECIMAL_RE.is_match(value)) {
        let comma_total: usize = values.iter().map(|value| value.matches(',').count()).sum();
        return if comma_total > config.unit_price_comma_threshold {
            SemanticRole::UnitPrice
        } else {
            SemanticRole::TotalPrice
        };
    }

    let mean_len = values
        .iter()
        .map(|value| value.chars().count())
        .sum::<usize>() as f32
        / values.len() as f32;
    if mean_len > config.description_mean_len {
        return SemanticRole::Description;
    }

    SemanticRole::Unlabeled
}

/// Classifies every column of a normalized grid independently. Duplicate
/// roles are possible and left as-is; the merger resolves key collisions.
pub(crate) fn classify_fragment(grid: NormalizedGrid, config: &ClassifierConfig) -> ClassifiedFragment {
    let roles = (0..grid.width)
        .map(|index| {
            let values: Vec<&str> = grid.column_values(index).collect();
            classify_column(&values, config)
        })
        .collect();

    ClassifiedFragment { grid, roles }
}
