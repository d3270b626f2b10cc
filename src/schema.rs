//! Schema Description - flat textual view of the database catalog

use serde::{Deserialize, Serialize};
use std::fmt;

/// One base table and its column names in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
}

/// Base tables in catalog order.
///
/// Read once per session and handed to the prompt builder through
/// its `Display` form:
///
/// ```text
/// Tables:
/// - Laptops (Id, Brand, Cpu)
/// - Users (Id, Name)
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub tables: Vec<TableSchema>,
}

impl SchemaDescription {
    pub fn new(tables: Vec<TableSchema>) -> Self {
        Self { tables }
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

impl fmt::Display for SchemaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tables:")?;
        for table in &self.tables {
            writeln!(f, "- {} ({})", table.name, table.columns.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_lists_tables_under_header() {
        let schema = SchemaDescription::new(vec![
            TableSchema {
                name: "Laptops".to_string(),
                columns: vec!["Id".to_string(), "Brand".to_string(), "Cpu".to_string()],
            },
            TableSchema {
                name: "Users".to_string(),
                columns: vec!["Id".to_string(), "Name".to_string()],
            },
        ]);

        assert_eq!(
            schema.to_string(),
            "Tables:\n- Laptops (Id, Brand, Cpu)\n- Users (Id, Name)\n"
        );
    }

    #[test]
    fn test_empty_schema_is_header_only() {
        assert_eq!(SchemaDescription::default().to_string(), "Tables:\n");
    }
}
