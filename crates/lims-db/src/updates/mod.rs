//! Update builder types for entity mutations.
//!
//! Each builder produces an update struct with `Option` fields. Only `Some`
//! fields generate SET clauses in the dynamic UPDATE SQL. The update struct is
//! serialized as the audit `detail` payload (changed fields only).

pub mod item;
pub mod product;
pub mod project;

/// Accumulates `column = ?N` clauses and their parameters.
#[derive(Debug, Default)]
pub(crate) struct SetClauses {
    sets: Vec<String>,
    params: Vec<libsql::Value>,
}

impl SetClauses {
    pub(crate) fn push(&mut self, column: &str, value: impl Into<libsql::Value>) {
        self.params.push(value.into());
        self.sets.push(format!("{column} = ?{}", self.params.len()));
    }

    pub(crate) fn push_opt<T: Into<libsql::Value>>(&mut self, column: &str, value: Option<T>) {
        self.push(column, value.map_or(libsql::Value::Null, Into::into));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Build `UPDATE {table} SET ... WHERE id = ?N` and its parameters.
    pub(crate) fn into_update(mut self, table: &str, id: &str) -> (String, Vec<libsql::Value>) {
        self.params.push(id.into());
        let sql = format!(
            "UPDATE {table} SET {} WHERE id = ?{}",
            self.sets.join(", "),
            self.params.len()
        );
        (sql, self.params)
    }
}
