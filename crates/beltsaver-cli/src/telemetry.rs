use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "BELTSAVER_LOG";

/// Filter used when neither `BELTSAVER_LOG` nor `RUST_LOG` is set.
///
/// `--verbose` only opens up our own crates; reqwest and hyper stay at `warn`.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,beltsaver=debug,beltsaver_core=debug,beltsaver_assist=debug"
    } else {
        "warn"
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

/// Install the global subscriber on stderr, keeping stdout for answers.
pub fn init_tracing(json: bool, verbose: bool) {
    let layer = fmt::layer()
        .with_target(verbose)
        .with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(env_filter(verbose));

    let installed = if json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };
    if let Err(e) = installed {
        eprintln!("logging disabled: {e}");
    }
}
