pub mod abundance;
pub mod aging;
pub mod allocator;
pub mod catch;
pub mod diffusion;
pub mod error;
pub mod events;
pub mod initializer;
pub mod local_biology;
pub mod meristics;
pub mod metrics;
pub mod model;
pub mod mortality;
pub mod parameters;
pub mod reallocator;
pub mod recruitment;
pub mod scenario;
pub mod selectivity;
pub mod spatial;
pub mod species;

#[cfg(test)]
mod local_biology_test;
#[cfg(test)]
mod meristics_test;
#[cfg(test)]
mod recruitment_test;
#[cfg(test)]
mod selectivity_test;
