use std::collections::BTreeSet;
use std::str::FromStr;

/// What to do with the first row of every detected grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPolicy {
    /// Drop the first row unconditionally. This matches the source system's
    /// behavior and is lossy: when the first row is genuine data (e.g. a
    /// table continued from the previous page) it is permanently discarded.
    /// Loss is bounded to exactly one row per fragment.
    #[default]
    StripFirst,
    /// Keep every row as data.
    Keep,
    /// Drop the first row only when it looks like a header (non-numeric
    /// first row over a numeric-leaning second row).
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityMode {
    /// Keep low-confidence grids and attach a warning.
    #[default]
    BestEffort,
    /// Fail the run on the first low-confidence grid.
    Strict,
    /// Drop low-confidence grids and attach a warning.
    SkipAmbiguous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for token in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range start: '{start}'"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range end: '{end}'"))?;
                if start == 0 || end == 0 {
                    return Err("pages are 1-based".to_string());
                }
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| format!("invalid page number: '{token}'"))?;
                if page == 0 {
                    return Err("pages are 1-based".to_string());
                }
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { pages })
    }
}

/// Unit-of-measure abbreviations recognized by the classifier, matched as
/// whole tokens, case-insensitively.
pub const DEFAULT_UNIT_TOKENS: [&str; 6] = ["UN", "UND", "CX", "PÇ", "PC", "KIT"];

/// Default column-wide comma count above which a comma-decimal column is
/// read as unit price rather than total price.
pub const DEFAULT_UNIT_PRICE_COMMA_THRESHOLD: usize = 5;

/// Default mean value length above which a column is read as free text.
pub const DEFAULT_DESCRIPTION_MEAN_LEN: f32 = 20.0;

/// Thresholds driving column-role inference. All of these are heuristics
/// tuned on the procurement documents this tool was written for; none of
/// them carries a semantic guarantee.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Comma occurrences across a comma-decimal column above which it is
    /// classified `unit_price` instead of `total_price`.
    pub unit_price_comma_threshold: usize,
    /// Mean value length (in characters) above which a column is classified
    /// `description`.
    pub description_mean_len: f32,
    /// Whole-token unit abbreviations, uppercase.
    pub unit_tokens: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            unit_price_comma_threshold: DEFAULT_UNIT_PRICE_COMMA_THRESHOLD,
            description_mean_len: DEFAULT_DESCRIPTION_MEAN_LEN,
            unit_tokens: DEFAULT_UNIT_TOKENS.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub pages: Option<PageSelection>,
    pub delimiter: u8,
    pub header_policy: HeaderPolicy,
    pub quality_mode: QualityMode,
    pub min_cols: usize,
    pub classifier: ClassifierConfig,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: None,
            delimiter: b',',
            header_policy: HeaderPolicy::default(),
            quality_mode: QualityMode::default(),
            min_cols: 2,
            classifier: ClassifierConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassifierConfig, PageSelection};
    use std::str::FromStr;

    #[test]
    fn parse_page_selection_range_and_single() {
        let selection = PageSelection::from_str("1-3,5").expect("selection should parse");
        assert!(selection.contains(1));
        assert!(selection.contains(2));
        assert!(selection.contains(3));
        assert!(selection.contains(5));
        assert!(!selection.contains(4));
    }

    #[test]
    fn reject_invalid_page_selection() {
        let err = PageSelection::from_str("3-1").expect_err("invalid range should fail");
        assert!(err.contains("invalid range"));
    }

    #[test]
    fn reject_zero_page() {
        let err = PageSelection::from_str("0").expect_err("zero page should fail");
        assert!(err.contains("1-based"));
    }

    #[test]
    fn classifier_defaults() {
        let config = ClassifierConfig::default();
        assert_eq!(config.unit_price_comma_threshold, 5);
        assert!((config.description_mean_len - 20.0).abs() < f32::EPSILON);
        assert!(config.unit_tokens.iter().any(|token| token == "KIT"));
    }
}
