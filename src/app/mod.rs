pub mod context;
pub mod error;

pub use context::AppContext;
pub use error::{NewsflowError, Result};

/// Install a tracing subscriber honoring `RUST_LOG`. Embedders that bring
/// their own subscriber can skip this.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
