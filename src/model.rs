/// Text content of one source page, as produced by the PDF reader or by an
/// external detection collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// One detected table region before normalization. Rows may be ragged.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGrid {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
    pub confidence: f32,
}

impl RawGrid {
    /// Builds a grid from pre-extracted rows, e.g. fed in by an external
    /// table-detection collaborator instead of the built-in detector.
    #[must_use]
    pub fn from_rows(page: u32, rows: Vec<Vec<String>>) -> Self {
        Self {
            page,
            rows,
            confidence: 1.0,
        }
    }
}

/// A raw grid after width fixing, header handling and blank-row removal.
/// Invariant: every row holds exactly `width` cells and `width >= 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedGrid {
    pub page: u32,
    pub width: usize,
    pub rows: Vec<Vec<String>>,
}

impl NormalizedGrid {
    pub(crate) fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[index].as_str())
    }
}

/// Semantic meaning inferred for one column of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticRole {
    Code,
    CostCenter,
    Unit,
    Quantity,
    UnitPrice,
    TotalPrice,
    Description,
    Unlabeled,
}

impl SemanticRole {
    /// Canonical output order for merged-table columns. `Unlabeled` columns
    /// never appear under a role key and are excluded.
    pub const TAXONOMY: [Self; 7] = [
        Self::Code,
        Self::CostCenter,
        Self::Unit,
        Self::Quantity,
        Self::UnitPrice,
        Self::TotalPrice,
        Self::Description,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::CostCenter => "cost_center",
            Self::Unit => "unit",
            Self::Quantity => "quantity",
            Self::UnitPrice => "unit_price",
            Self::TotalPrice => "total_price",
            Self::Description => "description",
            Self::Unlabeled => "unlabeled",
        }
    }
}

/// A normalized grid plus its fragment-local column-to-role assignment.
/// Duplicate roles across columns are allowed; consumers must tolerate them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFragment {
    pub grid: NormalizedGrid,
    pub roles: Vec<SemanticRole>,
}

/// Identity of a merged-table column: an inferred role, or the 1-based
/// source position for columns that carry no usable role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    Role(SemanticRole),
    Position(usize),
}

impl ColumnKey {
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::Role(role) => role.as_str().to_string(),
            Self::Position(index) => format!("col_{index}"),
        }
    }
}

/// The single logical table formed from all surviving fragments.
/// Built once per run and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    pub columns: Vec<ColumnKey>,
    pub rows: Vec<Vec<String>>,
    pub fragment_count: usize,
    pub row_count: usize,
}

impl MergedTable {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            fragment_count: 0,
            row_count: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn header_labels(&self) -> Vec<String> {
        self.columns.iter().map(|key| key.label()).collect()
    }

    #[must_use]
    pub fn column_index(&self, key: ColumnKey) -> Option<usize> {
        self.columns.iter().position(|candidate| *candidate == key)
    }
}

/// Row subset of a merged table under one set of filter parameters.
/// Recomputed on every parameter change, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    pub columns: Vec<ColumnKey>,
    pub rows: Vec<Vec<String>>,
}

impl FilteredView {
    #[must_use]
    pub fn header_labels(&self) -> Vec<String> {
        self.columns.iter().map(|key| key.label()).collect()
    }
}
