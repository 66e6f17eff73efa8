pub mod accreditation_repo;
pub use accreditation_repo::{AccreditationRepository, OrgBucket};
