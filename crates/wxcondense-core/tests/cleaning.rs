use polars::df;
use polars::prelude::*;

use wxcondense_core::encode::encode_weather;
use wxcondense_core::normalize::normalize_frame;
use wxcondense_core::{clean_observations, CleanError, LcdSchema, PipelineConfig};

const JAN_1_2020: i32 = 18_262;

fn small_config() -> PipelineConfig {
    PipelineConfig {
        schema: LcdSchema {
            measurement_columns: vec![
                "DailyAverageDryBulbTemperature".into(),
                "DailyPrecipitation".into(),
                "DailySustainedWindSpeed".into(),
            ],
            ..LcdSchema::default()
        },
        ..PipelineConfig::default()
    }
}

fn days(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i32>>> {
    Ok(df
        .column(name)?
        .cast(&DataType::Int32)?
        .i32()?
        .into_iter()
        .collect())
}

fn floats(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    Ok(df.column(name)?.f64()?.into_iter().collect())
}

#[test]
fn trace_precipitation_and_weather_codes_are_encoded() -> anyhow::Result<()> {
    let raw = df![
        "DATE" => ["2020-01-01T10:00:00", "2020-01-01T23:59:00"],
        "DailyAverageDryBulbTemperature" => [Some("50"), Some("48s")],
        "DailyPrecipitation" => [Some("0.10"), Some("T")],
        "DailySustainedWindSpeed" => [Some(" "), Some("*")],
        "DailyWeather" => [Some("RA"), None],
    ]?;

    let cleaned = clean_observations(&raw, &small_config())?;
    let df = &cleaned.dataframe;

    assert_eq!(df.get_column_names()[0].as_str(), "DATE");
    assert_eq!(df.column("DATE")?.dtype(), &DataType::Date);
    assert_eq!(days(df, "DATE")?, vec![Some(JAN_1_2020), Some(JAN_1_2020)]);
    assert_eq!(floats(df, "DailyWeather")?, vec![Some(1.0), Some(0.0)]);
    assert_eq!(floats(df, "DailyPrecipitation")?, vec![Some(0.10), Some(0.0)]);
    assert_eq!(
        floats(df, "DailyAverageDryBulbTemperature")?,
        vec![Some(50.0), Some(48.0)]
    );
    assert_eq!(floats(df, "DailySustainedWindSpeed")?, vec![None, None]);
    assert_eq!(cleaned.report.total_coercion_failures(), 0);
    Ok(())
}

#[test]
fn trace_marker_with_suffix_becomes_zero() -> anyhow::Result<()> {
    let raw = df![
        "DATE" => ["2020-01-01", "2020-01-02"],
        "DailyAverageDryBulbTemperature" => [Some("40"), Some("41")],
        "DailyPrecipitation" => [Some("Ts"), Some("0.25s")],
        "DailySustainedWindSpeed" => [Some("5"), Some("7")],
        "DailyWeather" => [Some("BR"), Some("HZ")],
    ]?;

    let cleaned = clean_observations(&raw, &small_config())?;
    assert_eq!(
        floats(&cleaned.dataframe, "DailyPrecipitation")?,
        vec![Some(0.0), Some(0.25)]
    );
    assert_eq!(
        floats(&cleaned.dataframe, "DailyWeather")?,
        vec![Some(1.0), Some(0.0)]
    );
    Ok(())
}

#[test]
fn rows_without_measurements_are_dropped() -> anyhow::Result<()> {
    let raw = df![
        "DATE" => ["2020-01-01", "2020-01-02", "2020-01-03"],
        "DailyAverageDryBulbTemperature" => [Some("50"), Some(" "), None],
        "DailyPrecipitation" => [Some("0.0"), None, Some("0.3")],
        "DailySustainedWindSpeed" => [Some("3"), Some("*"), None],
        "DailyWeather" => [None, Some("RA"), None],
    ]?;

    let cleaned = clean_observations(&raw, &small_config())?;
    let df = &cleaned.dataframe;

    assert_eq!(df.height(), 2);
    assert_eq!(cleaned.report.vacuous_rows_dropped, 1);
    assert_eq!(days(df, "DATE")?, vec![Some(JAN_1_2020), Some(JAN_1_2020 + 2)]);

    let span = ["DailyAverageDryBulbTemperature", "DailyPrecipitation", "DailySustainedWindSpeed"];
    for idx in 0..df.height() {
        let mut any_present = false;
        for name in span {
            if df.column(name)?.f64()?.get(idx).is_some() {
                any_present = true;
            }
        }
        assert!(any_present, "row {idx} has no measurement left");
    }
    Ok(())
}

#[test]
fn rows_left_with_only_unreadable_measurements_are_dropped() -> anyhow::Result<()> {
    let raw = df![
        "DATE" => ["2020-01-01", "2020-01-02", "2020-01-03", "2020-01-04"],
        "DailyAverageDryBulbTemperature" => [Some("M"), Some("  "), Some("s"), Some("50")],
        "DailyPrecipitation" => [Some("M"), None, Some("*s"), Some("0.0")],
        "DailySustainedWindSpeed" => [None::<&str>, None, None, Some("3")],
        "DailyWeather" => [Some("RA"), None, None, None],
    ]?;

    let cleaned = clean_observations(&raw, &small_config())?;
    let df = &cleaned.dataframe;
    let report = &cleaned.report;

    assert_eq!(df.height(), 1);
    assert_eq!(days(df, "DATE")?, vec![Some(JAN_1_2020 + 3)]);
    assert_eq!(report.vacuous_rows_dropped, 0);
    assert_eq!(report.unreadable_rows_dropped, 3);
    assert_eq!(report.output_rows, 1);
    assert_eq!(report.coercion_failures.get("DailyAverageDryBulbTemperature"), Some(&3));
    assert_eq!(report.coercion_failures.get("DailyPrecipitation"), Some(&2));

    let span = ["DailyAverageDryBulbTemperature", "DailyPrecipitation", "DailySustainedWindSpeed"];
    for idx in 0..df.height() {
        let mut any_present = false;
        for name in span {
            if df.column(name)?.f64()?.get(idx).is_some() {
                any_present = true;
            }
        }
        assert!(any_present, "row {idx} has no measurement left");
    }
    Ok(())
}

#[test]
fn trailing_columns_keep_rows_alive() -> anyhow::Result<()> {
    let mut config = small_config();
    config.schema.trailing_columns = vec!["Sunrise".into()];

    let raw = df![
        "DATE" => ["2020-01-01"],
        "DailyAverageDryBulbTemperature" => [None::<&str>],
        "DailyPrecipitation" => [None::<&str>],
        "DailySustainedWindSpeed" => [None::<&str>],
        "Sunrise" => [Some("0712")],
        "DailyWeather" => [None::<&str>],
    ]?;

    let cleaned = clean_observations(&raw, &config)?;
    assert_eq!(cleaned.dataframe.height(), 1);
    assert_eq!(floats(&cleaned.dataframe, "Sunrise")?, vec![Some(712.0)]);
    Ok(())
}

#[test]
fn unreadable_numbers_become_null_and_are_counted() -> anyhow::Result<()> {
    let raw = df![
        "DATE" => ["2020-01-01", "2020-01-01"],
        "DailyAverageDryBulbTemperature" => [Some("M"), Some("61")],
        "DailyPrecipitation" => [Some("0.0"), Some("0.0")],
        "DailySustainedWindSpeed" => [Some("4"), Some("VRB")],
        "DailyWeather" => [None::<&str>, None],
    ]?;

    let cleaned = clean_observations(&raw, &small_config())?;
    let report = &cleaned.report;

    assert_eq!(
        floats(&cleaned.dataframe, "DailyAverageDryBulbTemperature")?,
        vec![None, Some(61.0)]
    );
    assert_eq!(report.coercion_failures.get("DailyAverageDryBulbTemperature"), Some(&1));
    assert_eq!(report.coercion_failures.get("DailySustainedWindSpeed"), Some(&1));
    assert_eq!(report.total_coercion_failures(), 2);
    Ok(())
}

#[test]
fn rows_without_dates_are_dropped() -> anyhow::Result<()> {
    let raw = df![
        "DATE" => [Some("2020-01-01"), None, Some("garbage")],
        "DailyAverageDryBulbTemperature" => ["1", "2", "3"],
        "DailyPrecipitation" => ["0.0", "0.0", "0.0"],
        "DailySustainedWindSpeed" => ["1", "1", "1"],
        "DailyWeather" => ["RA", "RA", "RA"],
    ]?;

    let cleaned = clean_observations(&raw, &small_config())?;
    assert_eq!(cleaned.dataframe.height(), 1);
    assert_eq!(cleaned.report.undated_rows_dropped, 2);
    assert_eq!(cleaned.report.output_rows, 1);
    Ok(())
}

#[test]
fn datetime_dates_are_truncated_to_the_day() -> anyhow::Result<()> {
    // 2020-01-01 12:00:00 and 2020-01-02 00:00:00 UTC.
    let micros = vec![1_577_880_000_000_000i64, 1_577_923_200_000_000];
    let date = Series::new("DATE".into(), micros)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

    let mut raw = df![
        "DailyAverageDryBulbTemperature" => ["30", "31"],
        "DailyPrecipitation" => ["0.0", "0.0"],
        "DailySustainedWindSpeed" => ["2", "2"],
        "DailyWeather" => ["SN", "SN"],
    ]?;
    raw.with_column(date)?;

    let cleaned = clean_observations(&raw, &small_config())?;
    assert_eq!(
        days(&cleaned.dataframe, "DATE")?,
        vec![Some(JAN_1_2020), Some(JAN_1_2020 + 1)]
    );
    assert_eq!(cleaned.dataframe.get_column_names()[0].as_str(), "DATE");
    Ok(())
}

#[test]
fn zoned_datetimes_are_truncated_on_the_local_day() -> anyhow::Result<()> {
    // 2020-01-01 12:00 and 2020-01-02 03:00 UTC, both 1 January in New York.
    let millis = vec![1_577_880_000_000i64, 1_577_934_000_000];
    let zone = TimeZone::opt_try_new(Some("America/New_York"))?;
    let date = Series::new("DATE".into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, zone))?;

    let mut raw = df![
        "DailyAverageDryBulbTemperature" => ["30", "31"],
        "DailyPrecipitation" => ["0.0", "0.0"],
        "DailySustainedWindSpeed" => ["2", "2"],
        "DailyWeather" => ["SN", "SN"],
    ]?;
    raw.with_column(date)?;

    let cleaned = clean_observations(&raw, &small_config())?;
    assert_eq!(
        days(&cleaned.dataframe, "DATE")?,
        vec![Some(JAN_1_2020), Some(JAN_1_2020)]
    );
    Ok(())
}

#[test]
fn missing_columns_fail_fast() -> anyhow::Result<()> {
    let raw = df![
        "DATE" => ["2020-01-01"],
        "DailyAverageDryBulbTemperature" => ["1"],
        "DailyWeather" => ["RA"],
    ]?;

    match clean_observations(&raw, &small_config()) {
        Err(CleanError::SchemaMismatch { missing }) => {
            assert_eq!(
                missing,
                vec![
                    "DailyPrecipitation".to_string(),
                    "DailySustainedWindSpeed".to_string()
                ]
            );
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }
    Ok(())
}

#[test]
fn input_frame_is_left_untouched() -> anyhow::Result<()> {
    let raw = df![
        "DATE" => ["2020-01-01"],
        "DailyAverageDryBulbTemperature" => ["5s"],
        "DailyPrecipitation" => ["T"],
        "DailySustainedWindSpeed" => ["*"],
        "DailyWeather" => ["RA"],
    ]?;
    let before = raw.clone();

    clean_observations(&raw, &small_config())?;
    assert!(raw.equals_missing(&before));
    Ok(())
}

#[test]
fn encoding_twice_changes_nothing() -> PolarsResult<()> {
    let raw = df![
        "DailyWeather" => [Some("TSRA BR"), Some("HZ"), None, Some("-FZDZ")],
    ]?;
    let codes = PipelineConfig::default().precipitation_codes;

    let once = encode_weather(&raw, "DailyWeather", codes.as_slice())?;
    let twice = encode_weather(&once, "DailyWeather", codes.as_slice())?;

    let flags: Vec<Option<&str>> = once.column("DailyWeather")?.str()?.into_iter().collect();
    assert_eq!(flags, vec![Some("1"), Some("0"), None, Some("1")]);
    assert!(once.equals_missing(&twice));
    Ok(())
}

#[test]
fn normalizer_only_touches_text() -> PolarsResult<()> {
    let raw = df![
        "text" => [Some("12s*"), Some("sss"), None],
        "numeric" => [Some(1.5f64), None, Some(3.0)],
    ]?;

    let normalized = normalize_frame(&raw, &['s', '*'])?;
    let text: Vec<Option<&str>> = normalized.column("text")?.str()?.into_iter().collect();
    assert_eq!(text, vec![Some("12"), Some(""), None]);
    for cell in text.into_iter().flatten() {
        assert!(!cell.contains('s') && !cell.contains('*'));
    }
    assert!(normalized
        .column("numeric")?
        .as_materialized_series()
        .equals_missing(raw.column("numeric")?.as_materialized_series()));
    Ok(())
}
