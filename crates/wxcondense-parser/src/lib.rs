pub mod errors;
pub mod lcd;
pub mod model;
mod stack;

pub use errors::ParserError;
pub use lcd::{parse_lcd_csv, parse_lcd_csv_with, ReadOptions};
pub use model::RawObservations;
pub use stack::stack_observations;
