use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging on stderr.
///
/// Default level is WARN so command output stays clean.
/// - `-v` => INFO
/// - `-vv` => DEBUG
/// - `-vvv` => TRACE
/// - `-q` => ERROR
///
/// `FITDAY_LOG` (then `RUST_LOG`) overrides the flags.
pub fn init_logging(verbose: u8, quiet: u8) {
    let filter = EnvFilter::try_from_env("FITDAY_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose, quiet)));

    let level = level_for(verbose, quiet);
    let show_src = matches!(level, "debug" | "trace");

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_target(show_src)
        .with_file(show_src)
        .with_line_number(show_src)
        .compact()
        .init();
}

fn level_for(verbose: u8, quiet: u8) -> &'static str {
    match i16::from(verbose) - i16::from(quiet) {
        i16::MIN..=-1 => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        3..=i16::MAX => "trace",
    }
}

fn default_directives(verbose: u8, quiet: u8) -> String {
    let level = level_for(verbose, quiet);
    format!("warn,fitday={level},fitday_core={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_flags() {
        assert_eq!(level_for(0, 0), "warn");
        assert_eq!(level_for(1, 0), "info");
        assert_eq!(level_for(2, 0), "debug");
        assert_eq!(level_for(5, 0), "trace");
        assert_eq!(level_for(0, 1), "error");
        assert_eq!(level_for(1, 1), "warn");
    }

    #[test]
    fn test_default_directives_cover_both_crates() {
        assert_eq!(
            default_directives(2, 0),
            "warn,fitday=debug,fitday_core=debug"
        );
    }
}
