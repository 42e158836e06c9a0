use polars::prelude::*;

/// Present-weather codes that indicate precipitation: thunderstorm, hail,
/// funnel cloud, blowing spray, mist, drizzle, rain, unknown precipitation.
pub const PRECIPITATION_CODES: [&str; 8] = ["TS", "GR", "FC", "BLPY", "BR", "DZ", "RA", "UP"];

/// Encodes a condition string as a precipitation flag. Cells already holding
/// a flag keep it, so encoding an encoded column changes nothing.
pub fn encode_condition<S: AsRef<str>>(condition: &str, codes: &[S]) -> &'static str {
    match condition {
        "1" => return "1",
        "0" => return "0",
        _ => {}
    }

    let wet = codes
        .iter()
        .map(AsRef::as_ref)
        .filter(|code| !code.is_empty())
        .any(|code| condition.contains(code));
    if wet {
        "1"
    } else {
        "0"
    }
}

/// Overwrites `column` with `"1"`/`"0"` precipitation flags. Null cells stay
/// null so the cleaner can fill them later.
pub fn encode_weather<S: AsRef<str>>(
    df: &DataFrame,
    column: &str,
    codes: &[S],
) -> PolarsResult<DataFrame> {
    let source = df.column(column)?;

    let encoded: Vec<Option<&'static str>> = if source.dtype() == &DataType::String {
        source
            .str()?
            .into_iter()
            .map(|cell| cell.map(|condition| encode_condition(condition, codes)))
            .collect()
    } else {
        // Numeric flags from an earlier pass: non-zero means precipitation.
        source
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|cell| cell.filter(|flag| flag.is_finite()).map(numeric_flag))
            .collect()
    };

    let mut output = df.clone();
    output.with_column(Series::new(source.name().clone(), encoded))?;
    Ok(output)
}

fn numeric_flag(flag: f64) -> &'static str {
    if flag != 0.0 {
        "1"
    } else {
        "0"
    }
}
