use polars::prelude::*;

/// Removes every occurrence of the strip characters from a text cell.
pub fn normalize_token(value: &str, strip_chars: &[char]) -> String {
    value.chars().filter(|c| !strip_chars.contains(c)).collect()
}

/// Applies [`normalize_token`] to every text column. Non-text columns and
/// null cells are returned untouched.
pub fn normalize_frame(df: &DataFrame, strip_chars: &[char]) -> PolarsResult<DataFrame> {
    let mut output = df.clone();

    for column in df.get_columns() {
        if column.dtype() != &DataType::String {
            continue;
        }

        let values = column.str()?;
        let normalized: Vec<Option<String>> = values
            .into_iter()
            .map(|cell| cell.map(|text| normalize_token(text, strip_chars)))
            .collect();

        output.with_column(Series::new(column.name().clone(), normalized))?;
    }

    Ok(output)
}
