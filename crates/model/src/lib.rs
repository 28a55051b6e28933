pub mod region;
pub mod station;
pub mod trip;

pub use region::Region;
pub use station::Station;
pub use trip::{Gender, Trip, TripFeatures};
