//! Shared setup for the integration tests. Each test file in `tests/` is
//! its own crate, so this module is included via `#[path]` rather than
//! being a library dependency.

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
