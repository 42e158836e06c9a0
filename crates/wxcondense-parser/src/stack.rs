use polars::prelude::*;

/// Stacks several station frames into one table. Columns are the union of all
/// inputs in first-seen order; a station lacking a column contributes nulls.
/// Every column is stacked as text.
pub fn stack_observations(frames: &[&DataFrame]) -> PolarsResult<DataFrame> {
    let mut names: Vec<PlSmallStr> = Vec::new();
    for frame in frames {
        for name in frame.get_column_names() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }

    let mut combined: Option<DataFrame> = None;
    for frame in frames {
        let height = frame.height();
        let mut columns: Vec<Column> = Vec::with_capacity(names.len());
        for name in &names {
            let column = match frame.column(name.as_str()) {
                Ok(existing) => existing.cast(&DataType::String)?,
                Err(_) => Series::full_null(name.clone(), height, &DataType::String).into(),
            };
            columns.push(column);
        }
        let aligned = DataFrame::new(columns)?;

        match combined.as_mut() {
            Some(df) => {
                df.vstack_mut(&aligned)?;
            }
            None => combined = Some(aligned),
        }
    }

    Ok(combined.unwrap_or_default())
}
