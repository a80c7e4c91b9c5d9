use crate::{MAX_FIELD_NAME_LEN, MAX_SCHEMA_NAME_LEN};

/// Schema names become table names, so they share the store's identifier rules.
pub fn validate_schema_name(name: &str) -> Result<(), String> {
    validate_identifier("schema", name, MAX_SCHEMA_NAME_LEN)
}

pub fn validate_field_name(name: &str) -> Result<(), String> {
    validate_identifier("field", name, MAX_FIELD_NAME_LEN)
}

fn validate_identifier(what: &str, name: &str, max: usize) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("{what} name is empty"));
    }

    if name.len() > max {
        return Err(format!(
            "{what} name '{name}' is too long ({} bytes); the limit is {max}",
            name.len()
        ));
    }

    if name.chars().any(char::is_whitespace) {
        return Err(format!("{what} name '{name}' contains whitespace"));
    }

    Ok(())
}
