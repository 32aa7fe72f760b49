pub mod admission_step;
pub mod cache_lookup_step;
pub mod cache_store_step;
pub mod merge_step;
pub mod payload_decode_step;
pub mod recognition_step;
pub mod route_resolution_step;

pub use admission_step::AdmissionStep;
pub use cache_lookup_step::CacheLookupStep;
pub use cache_store_step::CacheStoreStep;
pub use merge_step::MergeStep;
pub use payload_decode_step::PayloadDecodeStep;
pub use recognition_step::RecognitionStep;
pub use route_resolution_step::RouteResolutionStep;
