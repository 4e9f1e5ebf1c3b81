mod configuration;
mod reader;
pub mod units;
mod value;

pub use configuration::Configuration;
pub use reader::ConfigReader;
pub use value::FromConfigValue;
