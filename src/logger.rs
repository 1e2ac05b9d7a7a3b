use log::LevelFilter;

/// Picks the log level for the CLI flags. `--quiet` wins over `--verbose`.
pub fn level_for(quiet: bool, verbose: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Initialises `env_logger`. An explicit `RUST_LOG` overrides the flags.
pub fn init(quiet: bool, verbose: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level_for(quiet, verbose));
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    builder.format_timestamp(None);
    let _ = builder.try_init();
}
