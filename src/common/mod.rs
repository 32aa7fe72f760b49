pub mod detection;
pub mod route;

pub use detection::{BoundingBox, CodeScanEntry, CodeScanResult, Detection, FrameResult, Scale};
pub use route::{Fare, RouteRecord};
