pub fn empty_insert() -> String {
    "Cannot compile an insert without any rows or columns.".to_string()
}

pub fn missing_table() -> String {
    "Cannot compile an insert without a target table.".to_string()
}

pub fn mismatched_insert_columns(row: usize) -> String {
    format!("Insert row {row} does not set the same columns as the first row.")
}
