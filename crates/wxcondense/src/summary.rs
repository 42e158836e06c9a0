use comfy_table::Table;
use serde::Serialize;
use wxcondense_core::{CleaningReport, CondenseReport};

#[derive(Debug, Serialize)]
pub struct InputSummary {
    pub path: String,
    pub content_hash: String,
    pub rows_read: usize,
    pub rows_kept: usize,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub inputs: Vec<InputSummary>,
    pub cleaning: CleaningReport,
    pub condense: Option<CondenseReport>,
}

impl RunSummary {
    pub fn render_table(&self) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["stage", "metric", "value"]);

        for input in &self.inputs {
            let hash_prefix: String = input.content_hash.chars().take(12).collect();
            table.add_row(vec![
                "read".to_string(),
                format!("{} ({hash_prefix})", input.path),
                format!("{}/{} rows", input.rows_kept, input.rows_read),
            ]);
        }

        let cleaning = &self.cleaning;
        for (metric, value) in [
            ("input rows", cleaning.input_rows),
            ("vacuous rows dropped", cleaning.vacuous_rows_dropped),
            ("unreadable rows dropped", cleaning.unreadable_rows_dropped),
            ("undated rows dropped", cleaning.undated_rows_dropped),
            ("output rows", cleaning.output_rows),
        ] {
            table.add_row(vec!["clean".to_string(), metric.to_string(), value.to_string()]);
        }
        for (column, failures) in &cleaning.coercion_failures {
            table.add_row(vec![
                "clean".to_string(),
                format!("non-numeric {column}"),
                failures.to_string(),
            ]);
        }

        if let Some(condense) = &self.condense {
            table.add_row(vec![
                "condense".to_string(),
                "dates".to_string(),
                condense.distinct_dates.to_string(),
            ]);
            table.add_row(vec![
                "condense".to_string(),
                "weather disagreements".to_string(),
                condense.weather_disagreements.to_string(),
            ]);
            for (column, filled) in &condense.filled_cells {
                table.add_row(vec![
                    "condense".to_string(),
                    format!("filled {column}"),
                    filled.to_string(),
                ]);
            }
            for (column, gaps) in &condense.unresolved_gaps {
                table.add_row(vec![
                    "condense".to_string(),
                    format!("unresolved {column}"),
                    gaps.to_string(),
                ]);
            }
        }

        table
    }
}
