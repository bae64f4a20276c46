pub mod general_parser;
pub mod settings_condition_parser;

pub use settings_condition_parser::{SettingsConditionTree, parse_condition_with_diagnostic};
