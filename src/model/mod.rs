pub mod estimate;
pub mod monthly;
pub mod price;

pub use estimate::{Direction, WeightedEstimate};
pub use monthly::{MonthlyReturn, YearMonth};
pub use price::{DateRange, PriceObservation};
