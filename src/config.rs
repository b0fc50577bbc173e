//! Configuration handling for ungroup

use std::path::{Path, PathBuf};

use crate::model::UniqueNamePolicy;

/// Output format for the ungrouped table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Csv,
    Json,
}

impl OutputFormat {
    /// Guess the format from an output file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "csv" | "tsv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Which columns get ungrouped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelection {
    /// Exactly these columns; each must exist and hold collections
    Names(Vec<String>),
    /// Every collection column except the excluded ones
    AllCollections { exclude: Vec<String> },
}

impl Default for ColumnSelection {
    fn default() -> Self {
        ColumnSelection::AllCollections { exclude: Vec::new() }
    }
}

/// Settings of the ungroup operation itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UngroupSettings {
    /// Columns to ungroup
    pub columns: ColumnSelection,
    /// Replace the collection columns in place instead of keeping them
    pub remove_collection_columns: bool,
    /// Drop generated rows whose new values are all missing
    pub skip_missing_values: bool,
    /// Record which generated rows came from which input row
    pub enable_hilite: bool,
    /// Naming of new columns that would clash with existing ones
    pub unique_names: UniqueNamePolicy,
}

impl Default for UngroupSettings {
    fn default() -> Self {
        Self {
            columns: ColumnSelection::default(),
            remove_collection_columns: true,
            skip_missing_values: false,
            enable_hilite: false,
            unique_names: UniqueNamePolicy::default(),
        }
    }
}

impl UngroupSettings {
    /// Ungroup exactly these columns
    pub fn with_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = ColumnSelection::Names(names.into_iter().map(Into::into).collect());
        self
    }

    /// Ungroup every collection column except these
    pub fn with_all_collections_except(mut self, exclude: Vec<String>) -> Self {
        self.columns = ColumnSelection::AllCollections { exclude };
        self
    }

    /// Replace (true) or keep (false) the collection columns
    pub fn with_remove_collection_columns(mut self, remove: bool) -> Self {
        self.remove_collection_columns = remove;
        self
    }

    /// Drop rows whose new values are all missing
    pub fn with_skip_missing_values(mut self, skip: bool) -> Self {
        self.skip_missing_values = skip;
        self
    }

    /// Build the original-to-derived key mapping
    pub fn with_hilite(mut self, enable: bool) -> Self {
        self.enable_hilite = enable;
        self
    }

    /// Set the naming policy for new columns
    pub fn with_unique_names(mut self, policy: UniqueNamePolicy) -> Self {
        self.unique_names = policy;
        self
    }
}

/// Configuration for a command-line run
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Path to the input file
    pub input_file: PathBuf,
    /// Where to write the result; stdout if unset
    pub output_file: Option<PathBuf>,
    /// Output format
    pub output_format: OutputFormat,
    /// Columns whose values form the row keys
    pub key_columns: Vec<String>,
    /// For Excel files: which sheet to read
    pub sheet_name: Option<String>,
    /// Where to write the hilite mapping
    pub hilite_file: Option<PathBuf>,
    /// Only print row counts
    pub stats_only: bool,
    /// Terminal output: rows to print before eliding the rest
    pub max_rows: Option<usize>,
    /// JSON output on a single line
    pub compact_json: bool,
    /// Settings of the operation
    pub ungroup: UngroupSettings,
}

impl Config {
    /// Create a new Config for an input file
    pub fn new(input_file: PathBuf) -> Self {
        Self {
            input_file,
            ..Default::default()
        }
    }

    /// Set the output file
    pub fn with_output_file(mut self, path: PathBuf) -> Self {
        self.output_file = Some(path);
        self
    }

    /// Set output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set key columns for row keys
    pub fn with_key_columns(mut self, keys: Vec<String>) -> Self {
        self.key_columns = keys;
        self
    }

    /// Set Excel sheet name
    pub fn with_sheet_name(mut self, name: String) -> Self {
        self.sheet_name = Some(name);
        self
    }

    /// Write the hilite mapping to a file; enables hilite tracking
    pub fn with_hilite_file(mut self, path: PathBuf) -> Self {
        self.hilite_file = Some(path);
        self.ungroup.enable_hilite = true;
        self
    }

    /// Enable stats-only mode
    pub fn with_stats_only(mut self, stats_only: bool) -> Self {
        self.stats_only = stats_only;
        self
    }

    /// Limit the rows printed to the terminal
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Write JSON without indentation
    pub fn with_compact_json(mut self, compact: bool) -> Self {
        self.compact_json = compact;
        self
    }

    /// Field delimiter for CSV output: tab for a `.tsv` output file
    pub fn csv_delimiter(&self) -> u8 {
        match self.output_file.as_deref().and_then(|p| p.extension()).and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
            _ => b',',
        }
    }

    /// Set the operation settings
    pub fn with_ungroup(mut self, settings: UngroupSettings) -> Self {
        let enable_hilite = settings.enable_hilite || self.hilite_file.is_some();
        self.ungroup = UngroupSettings {
            enable_hilite,
            ..settings
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = UngroupSettings::default();
        assert!(settings.remove_collection_columns);
        assert!(!settings.skip_missing_values);
        assert!(!settings.enable_hilite);
        assert_eq!(settings.columns, ColumnSelection::AllCollections { exclude: Vec::new() });
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("out.CSV")), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_path(Path::new("out.json")), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_path(Path::new("out.tsv")), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_path(Path::new("out.xlsx")), None);
        assert_eq!(OutputFormat::from_path(Path::new("out")), None);
    }

    #[test]
    fn test_hilite_file_survives_settings() {
        let config = Config::new(PathBuf::from("in.csv"))
            .with_hilite_file(PathBuf::from("map.json"))
            .with_ungroup(UngroupSettings::default().with_columns(["tags"]));
        assert!(config.ungroup.enable_hilite);
        assert_eq!(config.ungroup.columns, ColumnSelection::Names(vec!["tags".to_string()]));
    }

    #[test]
    fn test_csv_delimiter_follows_output_file() {
        let config = Config::new(PathBuf::from("in.csv"));
        assert_eq!(config.csv_delimiter(), b',');
        let config = config.with_output_file(PathBuf::from("out.TSV"));
        assert_eq!(config.csv_delimiter(), b'\t');
    }
}
