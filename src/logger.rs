/// Configures the global `env_logger` backend.
///
/// `verbose` lowers the threshold to `Debug` so every evaluated block,
/// resolved path and removed legacy file is reported.
pub fn init_logger(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .format_target(false)
        .init();
}
