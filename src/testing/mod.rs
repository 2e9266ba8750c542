pub mod properties;
pub mod scenarios;
pub mod state;

static LOGGER: std::sync::Once = std::sync::Once::new();

pub fn init_logging() {
    LOGGER.call_once(|| {
        env_logger::builder().is_test(true).init();
    });
}
