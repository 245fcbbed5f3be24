// Log setup for the terminal front end

use env_logger::{Builder, Env};

/// Variable that overrides the default filter
pub const LOG_ENV: &str = "YTDOWNLOADER_LOG";

const DEFAULT_FILTER: &str = "ytdownloader_lib=info,ytdownloader=info";

/// Route `log` records to stderr. Safe to call more than once.
pub fn init_logging() {
    let env = Env::default().filter_or(LOG_ENV, DEFAULT_FILTER);
    let _ = Builder::from_env(env)
        .format_timestamp_secs()
        .format_target(false)
        .try_init();
}
