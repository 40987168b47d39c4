use crate::row::Row;

/// Statement kinds understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Select,
}

/// A prepared statement handed to `Table::execute`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Insert a single row keyed by its id
    Insert(Row),
    /// Return every row reachable from the start of the table
    Select,
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::Insert(_) => StatementKind::Insert,
            Statement::Select => StatementKind::Select,
        }
    }

    /// Row carried by an insert statement
    pub fn row(&self) -> Option<&Row> {
        match self {
            Statement::Insert(row) => Some(row),
            Statement::Select => None,
        }
    }
}

/// Result of a successfully executed statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutput {
    Inserted,
    Rows(Vec<Row>),
}
