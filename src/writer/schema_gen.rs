use crate::schema::TableSchema;

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);
    let mut columns = Vec::new();

    let single_pk = match schema.primary_key {
        [only] => Some(*only),
        _ => None,
    };

    for col in schema.columns {
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        let pk = if single_pk == Some(col.name) { " PRIMARY KEY" } else { "" };

        columns.push(format!(
            "    {} {}{}{}",
            quote(col.name),
            col.col_type.sql(),
            pk,
            null_constraint
        ));
    }

    if single_pk.is_none() && !schema.primary_key.is_empty() {
        columns.push(format!(
            "    PRIMARY KEY ({})",
            schema.primary_key.join(", ")
        ));
    }

    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({}) ON UPDATE CASCADE",
            fk.column, fk.references_table, fk.references_column
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for foreign key columns
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .foreign_keys
        .iter()
        .map(|fk| {
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {}({})",
                schema.name, fk.column, schema.name, fk.column
            )
        })
        .collect()
}

/// INSERT for the given subset of columns, positional placeholders
pub fn generate_insert(schema: &TableSchema, columns: &[&str]) -> String {
    let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.name,
        quote_all(columns).join(", "),
        placeholders.join(", ")
    )
}

/// UPDATE by primary key. Placeholders: the set columns, then the key columns.
pub fn generate_update(schema: &TableSchema, set_columns: &[&str]) -> String {
    let assignments: Vec<String> = set_columns
        .iter()
        .map(|c| format!("{} = ?", quote(c)))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {}",
        schema.name,
        assignments.join(", "),
        key_clause(schema)
    )
}

/// DELETE by primary key
pub fn generate_delete(schema: &TableSchema) -> String {
    format!("DELETE FROM {} WHERE {}", schema.name, key_clause(schema))
}

/// `SELECT 1` by primary key
pub fn generate_exists(schema: &TableSchema) -> String {
    format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {})",
        schema.name,
        key_clause(schema)
    )
}

fn key_clause(schema: &TableSchema) -> String {
    schema
        .primary_key
        .iter()
        .map(|k| format!("{} = ?", quote(k)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

// Column identifiers are always double-quoted.
fn quote(name: &str) -> String {
    format!("\"{}\"", name)
}

fn quote_all(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| quote(n)).collect()
}
