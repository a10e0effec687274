use once_cell::sync::Lazy;

mod future;

static LOGGER: Lazy<()> = Lazy::new(|| {
    let _ = env_logger::builder().is_test(true).try_init();
});

/// Tests share one logger so per-test init order does not matter.
pub(crate) fn init_logging() {
    Lazy::force(&LOGGER);
}
