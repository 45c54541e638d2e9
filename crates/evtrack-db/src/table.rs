//! Validated destination table identifiers.
//!
//! The table name comes from configuration and is spliced into SQL text, so
//! only plain identifiers are accepted: an optional schema qualifier plus a
//! table name, each `[A-Za-z_][A-Za-z0-9_]*` and at most 63 bytes.

use std::fmt;

use crate::DbError;

const MAX_IDENT_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: Option<String>,
    table: String,
}

impl TableName {
    /// Parse `name` as `table` or `schema.table`. Identifiers are folded to
    /// lower case, matching how Postgres treats unquoted names.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidTableName`] for anything that is not a plain
    /// identifier.
    pub fn parse(name: &str) -> Result<Self, DbError> {
        let invalid = |reason: &str| DbError::InvalidTableName {
            name: name.to_owned(),
            reason: reason.to_owned(),
        };

        let parts: Vec<&str> = name.split('.').collect();
        let (schema, table) = match parts.as_slice() {
            [table] => (None, *table),
            [schema, table] => (Some(*schema), *table),
            _ => return Err(invalid("at most one schema qualifier is allowed")),
        };

        if let Some(schema) = schema {
            check_ident(schema).map_err(invalid)?;
        }
        check_ident(table).map_err(invalid)?;

        Ok(Self {
            schema: schema.map(str::to_ascii_lowercase),
            table: table.to_ascii_lowercase(),
        })
    }

    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.table),
            None => f.write_str(&self.table),
        }
    }
}

fn check_ident(ident: &str) -> Result<(), &'static str> {
    if ident.is_empty() {
        return Err("empty identifier");
    }
    if ident.len() > MAX_IDENT_LEN {
        return Err("identifier longer than 63 bytes");
    }
    let mut chars = ident.chars();
    if chars
        .next()
        .is_some_and(|c| !(c.is_ascii_alphabetic() || c == '_'))
    {
        return Err("identifier must start with a letter or underscore");
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("identifier may only contain letters, digits and underscores");
    }
    Ok(())
}
