//! Column containers: the ordered output of a walk and the keyed input row.

use std::collections::{BTreeMap, HashMap};

/// Ordered, unique column names with their values.
///
/// The first insertion of a name fixes its position; later insertions of the
/// same name overwrite the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    names: Vec<String>,
    values: HashMap<String, String>,
}

impl ColumnSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a column, keeping the first position and the last value.
    pub fn insert(&mut self, name: String, value: String) {
        if !self.values.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.values.insert(name, value);
    }

    /// Column names in canonical order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Value of a column.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Checks whether a column is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if there are no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Values aligned with [`ColumnSet::names`].
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        self.names
            .iter()
            .map(|name| self.values.get(name).map_or("", String::as_str))
            .collect()
    }

    /// Iterates `(name, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .map(|name| (name.as_str(), self.values.get(name).map_or("", String::as_str)))
    }

    /// Consumes the set, returning only the names.
    #[must_use]
    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

/// A parsed data row keyed by column name.
///
/// Lookups are independent of the column order in the file. When a header
/// repeats, the later cell wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: BTreeMap<String, String>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a row from a header and a value record of equal length.
    #[must_use]
    pub fn from_pairs<H, V>(headers: H, values: V) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let mut row = Self::new();
        for (header, value) in headers.into_iter().zip(values) {
            row.insert(header, value);
        }
        row
    }

    /// Sets a cell.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Value of a column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// Number of distinct columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the row has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates cells in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates `(column, suffix, value)` for every column starting with `prefix`.
    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str, &'a str)> + 'a {
        self.cells
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(move |(column, _)| column.starts_with(prefix))
            .map(move |(column, value)| {
                (column.as_str(), &column[prefix.len()..], value.as_str())
            })
    }
}

impl From<&ColumnSet> for Row {
    fn from(columns: &ColumnSet) -> Self {
        Self::from_pairs(
            columns.iter().map(|(name, _)| name.to_string()),
            columns.iter().map(|(_, value)| value.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_set_first_position_last_value() {
        let mut set = ColumnSet::new();
        set.insert("a".to_string(), "1".to_string());
        set.insert("b".to_string(), "2".to_string());
        set.insert("a".to_string(), "3".to_string());

        assert_eq!(set.names(), ["a", "b"]);
        assert_eq!(set.values(), vec!["3", "2"]);
    }

    #[test]
    fn test_row_duplicate_header_later_wins() {
        let row = Row::from_pairs(["x", "y", "x"], ["1", "2", "3"]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("x"), Some("3"));
    }

    #[test]
    fn test_row_prefix_scan() {
        let row = Row::from_pairs(
            ["items_0", "items_2", "item", "items_1_name", "stats"],
            ["a", "c", "z", "b", "s"],
        );
        let found: Vec<(&str, &str)> = row
            .with_prefix("items_")
            .map(|(_, suffix, value)| (suffix, value))
            .collect();
        assert_eq!(found, vec![("0", "a"), ("1_name", "b"), ("2", "c")]);
    }
}
