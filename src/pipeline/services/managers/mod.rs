pub mod admission_controller;
pub mod result_cache;

pub use admission_controller::AdmissionController;
pub use result_cache::ResultCache;
