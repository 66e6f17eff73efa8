pub mod admissions;
pub mod events;
pub mod rules;
