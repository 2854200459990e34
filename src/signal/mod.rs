pub mod index;
pub mod log_freq;
pub mod snapshot;
pub mod stabilizer;
