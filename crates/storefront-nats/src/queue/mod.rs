//! JetStream work queues.

mod cart_queue;

pub use cart_queue::{CartQueue, consumer_name, stream_name, subject};
