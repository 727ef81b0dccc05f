mod subscriber;

pub use subscriber::{init_subscriber, try_init_subscriber, TelemetryConfig};
