pub mod admission_service;
pub mod notifier;
pub mod quota;
pub mod zone;

pub use admission_service::AdmissionService;
