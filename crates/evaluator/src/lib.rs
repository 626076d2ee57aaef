pub mod activity_sampler;
pub mod cli;
pub mod endpoint_pool;
pub mod first_activity;
pub mod insights;
pub mod metrics;
pub mod persona_scoring;
pub mod service;
pub mod snapshot;

#[cfg(test)]
mod testing;
