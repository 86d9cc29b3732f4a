//! Typed schema definitions for the Trawl database
//!
//! Each table is declared once as a [`TableSchema`]. The same declaration is
//! used to create the table and to validate an existing database at startup.

use crate::storage::StorageError;
use rusqlite::Connection;

/// A column declaration
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub constraints: &'static str,
}

/// A secondary index declaration
#[derive(Debug, Clone, Copy)]
pub struct IndexDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// A table declaration
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    /// Table-level constraints such as foreign keys
    pub table_constraints: &'static [&'static str],
    pub indexes: &'static [IndexDef],
}

impl TableSchema {
    /// Renders the idempotent `CREATE TABLE` statement
    pub fn create_sql(&self) -> String {
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                if c.constraints.is_empty() {
                    format!("{} {}", c.name, c.sql_type)
                } else {
                    format!("{} {} {}", c.name, c.sql_type, c.constraints)
                }
            })
            .collect();
        parts.extend(self.table_constraints.iter().map(|c| c.to_string()));

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name,
            parts.join(",\n    ")
        )
    }

    /// Renders the idempotent `CREATE INDEX` statements
    pub fn index_sql(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|idx| {
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {}({})",
                    idx.name,
                    self.name,
                    idx.columns.join(", ")
                )
            })
            .collect()
    }
}

/// Every URL ever discovered, with its crawl status
pub const CRAWLER_QUEUE: TableSchema = TableSchema {
    name: "crawler_queue",
    columns: &[
        ColumnDef {
            name: "id",
            sql_type: "INTEGER",
            constraints: "PRIMARY KEY AUTOINCREMENT",
        },
        ColumnDef {
            name: "url",
            sql_type: "TEXT",
            constraints: "NOT NULL UNIQUE",
        },
        ColumnDef {
            name: "status",
            sql_type: "TEXT",
            constraints: "NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'processed'))",
        },
        ColumnDef {
            name: "timestamp",
            sql_type: "DATETIME",
            constraints: "DEFAULT CURRENT_TIMESTAMP",
        },
    ],
    table_constraints: &[],
    indexes: &[IndexDef {
        name: "idx_crawler_queue_status",
        columns: &["status"],
    }],
};

/// One indexing status record per crawled page
pub const INDEXING_STATUS: TableSchema = TableSchema {
    name: "indexing_status",
    columns: &[
        ColumnDef {
            name: "id",
            sql_type: "INTEGER",
            constraints: "PRIMARY KEY AUTOINCREMENT",
        },
        ColumnDef {
            name: "page_id",
            sql_type: "INTEGER",
            constraints: "NOT NULL UNIQUE",
        },
        ColumnDef {
            name: "status",
            sql_type: "TEXT",
            constraints: "NOT NULL DEFAULT 'pending' \
                          CHECK (status IN ('pending', 'indexing', 'indexed', 'failed'))",
        },
        ColumnDef {
            name: "last_indexed",
            sql_type: "DATETIME",
            constraints: "DEFAULT CURRENT_TIMESTAMP",
        },
        ColumnDef {
            name: "error",
            sql_type: "VARCHAR(255)",
            constraints: "DEFAULT NULL",
        },
    ],
    table_constraints: &["FOREIGN KEY (page_id) REFERENCES crawler_queue(id) ON DELETE CASCADE"],
    indexes: &[],
};

/// Keyword occurrences per page
pub const INVERTED_INDEX: TableSchema = TableSchema {
    name: "inverted_index",
    columns: &[
        ColumnDef {
            name: "id",
            sql_type: "INTEGER",
            constraints: "PRIMARY KEY AUTOINCREMENT",
        },
        ColumnDef {
            name: "keyword",
            sql_type: "VARCHAR(255)",
            constraints: "NOT NULL",
        },
        ColumnDef {
            name: "page_id",
            sql_type: "INTEGER",
            constraints: "NOT NULL",
        },
        ColumnDef {
            name: "frequency",
            sql_type: "INTEGER",
            constraints: "NOT NULL DEFAULT 1 CHECK (frequency > 0)",
        },
    ],
    table_constraints: &["FOREIGN KEY (page_id) REFERENCES crawler_queue(id) ON DELETE CASCADE"],
    indexes: &[
        IndexDef {
            name: "idx_inverted_index_keyword",
            columns: &["keyword"],
        },
        IndexDef {
            name: "idx_inverted_index_page",
            columns: &["page_id"],
        },
    ],
};

/// All tables, in dependency order
pub const TABLES: &[TableSchema] = &[CRAWLER_QUEUE, INDEXING_STATUS, INVERTED_INDEX];

/// Creates one table if it does not exist
pub fn create_table(conn: &Connection, schema: &TableSchema) -> Result<(), rusqlite::Error> {
    conn.execute_batch(&schema.create_sql())?;
    tracing::debug!("Table '{}' created or already exists", schema.name);
    Ok(())
}

/// Creates the secondary indexes of one table if they do not exist
pub fn create_indexes(conn: &Connection, schema: &TableSchema) -> Result<(), rusqlite::Error> {
    for sql in schema.index_sql() {
        conn.execute_batch(&sql)?;
    }
    Ok(())
}

/// Initializes the database schema
///
/// Tables are created first and validated before any index is declared, so
/// an existing table with foreign columns is reported as a schema mismatch.
pub fn initialize_schema(conn: &Connection) -> Result<(), StorageError> {
    for table in TABLES {
        create_table(conn, table)?;
    }
    validate_schema(conn)?;
    for table in TABLES {
        create_indexes(conn, table)?;
    }
    Ok(())
}

/// Checks that every declared column exists with its declared type
///
/// A database created by an older or foreign schema fails here at startup
/// instead of failing later on the first write.
pub fn validate_schema(conn: &Connection) -> Result<(), StorageError> {
    let mut problems = Vec::new();

    for table in TABLES {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table.name))?;
        let actual = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        if actual.is_empty() {
            problems.push(format!("table '{}' is missing", table.name));
            continue;
        }

        for column in table.columns {
            match actual.iter().find(|(name, _)| name == column.name) {
                None => problems.push(format!("{}.{} is missing", table.name, column.name)),
                Some((_, sql_type)) if !sql_type.eq_ignore_ascii_case(column.sql_type) => {
                    problems.push(format!(
                        "{}.{} has type {}, expected {}",
                        table.name, column.name, sql_type, column.sql_type
                    ))
                }
                Some(_) => {}
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(StorageError::Schema(problems.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
        assert!(validate_schema(&conn).is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["crawler_queue", "indexing_status", "inverted_index"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_create_sql_includes_constraints() {
        let sql = INDEXING_STATUS.create_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS indexing_status"));
        assert!(sql.contains("page_id INTEGER NOT NULL UNIQUE"));
        assert!(sql.contains("REFERENCES crawler_queue(id) ON DELETE CASCADE"));
    }

    #[test]
    fn test_validate_rejects_foreign_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE crawler_queue (id INTEGER PRIMARY KEY, link TEXT)")
            .unwrap();

        let err = initialize_schema(&conn).unwrap_err();
        assert!(matches!(err, StorageError::Schema(_)));
        assert!(err.to_string().contains("crawler_queue.url is missing"));
        assert!(err.to_string().contains("crawler_queue.status is missing"));
    }

    #[test]
    fn test_indexes_created_after_validation() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_validate_reports_missing_tables() {
        let conn = Connection::open_in_memory().unwrap();
        let err = validate_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("table 'inverted_index' is missing"));
    }
}
