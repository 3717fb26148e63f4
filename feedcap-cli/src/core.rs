pub mod battery;
pub mod error;
pub mod finance;
pub mod scenario;
pub mod series;
pub mod simulator;

pub use self::error::Error;
