pub mod quality;
pub mod seek;
pub mod watchdog;

pub use quality::QualityChangeCounter;
pub use seek::{SeekCorrelator, SeekWindow};
pub use watchdog::VideoStartWatchdog;
