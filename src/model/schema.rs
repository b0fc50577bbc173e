//! Column metadata, type information and table schemas

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Cell type for a column, either inferred from data or declared by the source format
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellType {
    #[default]
    Null,
    Bool,
    Int,
    Float,
    String,
    Date,
    DateTime,
    Mixed,
    /// A collection whose elements have the given type
    Collection(Box<CellType>),
}

impl CellType {
    /// Collection type with the given element type
    pub fn collection_of(element: CellType) -> Self {
        CellType::Collection(Box::new(element))
    }

    /// Element type if this is a collection type
    pub fn element_type(&self) -> Option<&CellType> {
        match self {
            CellType::Collection(element) => Some(element),
            _ => None,
        }
    }

    /// Check if this is a collection type
    pub fn is_collection(&self) -> bool {
        matches!(self, CellType::Collection(_))
    }

    /// Widen the type to accommodate another type
    pub fn widen(&self, other: &CellType) -> CellType {
        if self == other {
            return self.clone();
        }

        match (self, other) {
            (CellType::Null, t) | (t, CellType::Null) => t.clone(),
            (CellType::Int, CellType::Float) | (CellType::Float, CellType::Int) => CellType::Float,
            (CellType::Date, CellType::DateTime) | (CellType::DateTime, CellType::Date) => {
                CellType::DateTime
            }
            (CellType::Collection(a), CellType::Collection(b)) => CellType::collection_of(a.widen(b)),
            _ => CellType::Mixed,
        }
    }
}

impl std::fmt::Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellType::Null => write!(f, "null"),
            CellType::Bool => write!(f, "bool"),
            CellType::Int => write!(f, "int"),
            CellType::Float => write!(f, "float"),
            CellType::String => write!(f, "string"),
            CellType::Date => write!(f, "date"),
            CellType::DateTime => write!(f, "datetime"),
            CellType::Mixed => write!(f, "mixed"),
            CellType::Collection(element) => write!(f, "collection<{}>", element),
        }
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (from header)
    pub name: String,
    /// Column index (0-based position)
    pub index: usize,
    /// Cell type of the column
    pub cell_type: CellType,
}

impl Column {
    /// Create a new column with name and index
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            cell_type: CellType::Null,
        }
    }

    /// Create a column with a specified type
    pub fn with_type(name: impl Into<String>, index: usize, cell_type: CellType) -> Self {
        Self {
            name: name.into(),
            index,
            cell_type,
        }
    }
}

/// Ordered list of columns describing the cells of every row in a table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<Column>,
}

impl TableSchema {
    /// Build a schema, renumbering column indices to their positions
    pub fn new(columns: Vec<Column>) -> Self {
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(index, column)| Column { index, ..column })
            .collect();
        Self { columns }
    }

    /// All columns in order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column at a position
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Check whether a column with this name exists
    pub fn contains_name(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// How a clashing column name is made unique
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UniqueNamePolicy {
    /// `name (#1)`, `name (#2)`, ...
    #[default]
    Numbered,
    /// `name<sep>1`, `name<sep>2`, ...
    Suffix(String),
}

impl UniqueNamePolicy {
    fn candidate(&self, base: &str, n: usize) -> String {
        match self {
            UniqueNamePolicy::Numbered => format!("{} (#{})", base, n),
            UniqueNamePolicy::Suffix(sep) => format!("{}{}{}", base, sep, n),
        }
    }
}

/// Hands out column names that clash neither with a schema nor with earlier allocations
pub struct ColumnNameAllocator {
    taken: FxHashSet<String>,
    policy: UniqueNamePolicy,
}

impl ColumnNameAllocator {
    /// Start from the names of an existing schema
    pub fn new(schema: &TableSchema, policy: UniqueNamePolicy) -> Self {
        Self {
            taken: schema.names().map(str::to_string).collect(),
            policy,
        }
    }

    /// Allocate a unique name derived from `name`
    pub fn allocate(&mut self, name: &str) -> String {
        let base = name.trim();
        let mut result = base.to_string();
        let mut uniquifier = 1;
        while self.taken.contains(&result) {
            result = self.policy.candidate(base, uniquifier);
            uniquifier += 1;
        }
        self.taken.insert(result.clone());
        result
    }
}
