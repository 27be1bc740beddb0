// Table implementation
// A table is an ordered, read-only collection of records of one entity type

use super::{Id, Record};
use crate::query::QueryError;

/// Represents one entity collection of the dataset
/// Rows keep the order they were loaded in; every lookup is a linear scan
#[derive(Debug, Clone)]
pub struct Table<T> {
    /// Records in insertion order
    rows: Vec<T>,
}

impl<T: Record> Table<T> {
    /// Create a table from already-loaded records
    pub fn new(rows: Vec<T>) -> Self {
        Self { rows }
    }

    /// Every record, in stored order (full table scan)
    pub fn scan(&self) -> &[T] {
        &self.rows
    }

    /// The first record whose id matches, or None
    /// Absence is a normal result here, callers decide whether it is an error
    pub fn find(&self, id: &Id) -> Option<&T> {
        self.rows.iter().find(|row| row.id() == id)
    }

    /// Like [`Table::find`], but absence becomes [`QueryError::NotFound`]
    pub fn get(&self, id: &Id) -> Result<&T, QueryError> {
        self.find(id).ok_or_else(|| QueryError::NotFound {
            entity: T::ENTITY,
            id: id.clone(),
        })
    }

    /// All records matching the predicate, in stored order
    /// Returns an empty Vec (never an error) when nothing matches
    pub fn filter<P>(&self, predicate: P) -> Vec<&T>
    where
        P: Fn(&T) -> bool,
    {
        self.rows.iter().filter(|row| predicate(row)).collect()
    }

    /// Get the number of rows in the table
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Instructor;
    use serde_json::json;

    fn instructor(id: i64, name: &str) -> Instructor {
        serde_json::from_value(json!({"id": id, "name": name})).unwrap()
    }

    fn name(instructor: &Instructor) -> &str {
        instructor.extra["name"].as_str().unwrap()
    }

    fn table() -> Table<Instructor> {
        Table::new(vec![
            instructor(1, "Ada"),
            instructor(2, "Grace"),
            instructor(3, "Alan"),
            instructor(2, "Shadowed"),
        ])
    }

    #[test]
    fn test_find_returns_first_match() {
        let table = table();
        assert_eq!(name(table.find(&Id::from("2")).unwrap()), "Grace");
        assert!(table.find(&Id::from(9)).is_none());
    }

    #[test]
    fn test_get_reports_entity_on_miss() {
        let table = table();
        let err = table.get(&Id::from("x")).unwrap_err();
        assert_eq!(err.to_string(), "Instructor not found");
    }

    #[test]
    fn test_filter_preserves_insertion_order() {
        let table = table();
        let names: Vec<&str> = table
            .filter(|i| name(i).starts_with('A') || i.id == Id::from(2))
            .iter()
            .map(|i| name(*i))
            .collect();
        assert_eq!(names, vec!["Ada", "Grace", "Alan", "Shadowed"]);

        assert!(table.filter(|_| false).is_empty());
    }

    #[test]
    fn test_scan_is_verbatim() {
        let table = table();
        assert_eq!(table.len(), 4);
        assert_eq!(name(&table.scan()[3]), "Shadowed");
    }
}
