//! Time navigation: the set of real years and windows over it

mod axis;
mod window;

pub use axis::YearAxis;
pub use window::YearWindow;
