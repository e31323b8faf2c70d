pub mod backtest;
pub mod calibration;
pub mod fit;
pub mod resolver;
pub mod window;

pub use backtest::*;
pub use calibration::*;
pub use fit::*;
pub use resolver::*;
pub use window::*;
