pub mod frame_hashing;
pub mod preprocessing;

pub use frame_hashing::{Fingerprint, FingerprintHasher};
pub use preprocessing::{FrameResizer, PreparedFrame};
