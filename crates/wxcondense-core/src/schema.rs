use std::collections::HashSet;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::error::{CleanError, Result};

/// LCD daily summary columns, in feed order, from the first dry-bulb
/// temperature column through the sustained wind speed.
pub const LCD_DAILY_MEASUREMENT_COLUMNS: [&str; 18] = [
    "DailyAverageDryBulbTemperature",
    "DailyAverageRelativeHumidity",
    "DailyAverageSeaLevelPressure",
    "DailyAverageStationPressure",
    "DailyAverageWetBulbTemperature",
    "DailyAverageWindSpeed",
    "DailyCoolingDegreeDays",
    "DailyDepartureFromNormalAverageTemperature",
    "DailyHeatingDegreeDays",
    "DailyMaximumDryBulbTemperature",
    "DailyMinimumDryBulbTemperature",
    "DailyPeakWindDirection",
    "DailyPeakWindSpeed",
    "DailyPrecipitation",
    "DailySnowDepth",
    "DailySnowfall",
    "DailySustainedWindDirection",
    "DailySustainedWindSpeed",
];

/// Explicit description of the columns the cleaning pipeline touches.
///
/// `measurement_columns` receive sentinel replacement; `measurement_columns`
/// followed by `trailing_columns` form the span a row must have at least one
/// value in to survive pruning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LcdSchema {
    pub date_column: String,
    pub weather_column: String,
    pub precipitation_column: String,
    pub measurement_columns: Vec<String>,
    pub trailing_columns: Vec<String>,
}

impl Default for LcdSchema {
    fn default() -> Self {
        Self {
            date_column: "DATE".to_string(),
            weather_column: "DailyWeather".to_string(),
            precipitation_column: "DailyPrecipitation".to_string(),
            measurement_columns: LCD_DAILY_MEASUREMENT_COLUMNS
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            trailing_columns: Vec::new(),
        }
    }
}

impl LcdSchema {
    pub fn prune_columns(&self) -> impl Iterator<Item = &str> {
        self.measurement_columns
            .iter()
            .chain(self.trailing_columns.iter())
            .map(String::as_str)
    }

    /// Checks the schema is internally consistent, independent of any table.
    pub fn check(&self) -> Result<()> {
        if self.measurement_columns.is_empty() {
            return Err(CleanError::InvalidConfig(
                "measurement_columns must name at least one column".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in self.prune_columns() {
            if !seen.insert(name) {
                return Err(CleanError::InvalidConfig(format!(
                    "column {name} is listed more than once in the measurement span"
                )));
            }
        }

        for role in [&self.date_column, &self.weather_column] {
            if seen.contains(role.as_str()) {
                return Err(CleanError::InvalidConfig(format!(
                    "column {role} cannot be part of the measurement span"
                )));
            }
        }

        if self.date_column == self.weather_column {
            return Err(CleanError::InvalidConfig(
                "date_column and weather_column must differ".to_string(),
            ));
        }

        Ok(())
    }

    /// Fails with [`CleanError::SchemaMismatch`] listing every named column the
    /// table lacks.
    pub fn validate(&self, df: &DataFrame) -> Result<()> {
        self.check()?;

        let present: HashSet<&str> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .collect();

        let mut missing = Vec::new();
        let roles = [
            &self.date_column,
            &self.weather_column,
            &self.precipitation_column,
        ];
        for name in roles
            .into_iter()
            .map(String::as_str)
            .chain(self.prune_columns())
        {
            if !present.contains(name) && !missing.iter().any(|m: &String| m == name) {
                missing.push(name.to_string());
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CleanError::SchemaMismatch { missing })
        }
    }
}
