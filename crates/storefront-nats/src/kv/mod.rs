//! JetStream key-value backends.

mod profile_bucket;

pub use profile_bucket::{ProfileBucket, profile_key};
