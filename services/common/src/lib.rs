mod env;
mod logging;
mod net;

pub use env::{env_duration_ms, env_or, env_required, ConfigError};
pub use logging::{init_tracing, TracingGuards};
pub use net::{bind_listener, shutdown_signal};
