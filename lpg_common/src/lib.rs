mod points;

pub mod op;
mod secret;

pub use points::{Points, PointsConversionError, POINTS_SCALE};
pub use secret::Secret;
