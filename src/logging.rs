//! Tracing initialization.

use std::sync::Once;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

static INIT: Once = Once::new();

/// Installs the global tracing subscriber. Safe to call multiple times.
///
/// `RUST_LOG` overrides the default level (INFO, or DEBUG under a test runner).
/// Logs go to stderr: stdout is reserved for the MCP protocol stream. Under a test
/// runner they go through the test writer so captured output stays per test.
pub fn init() {
    INIT.call_once(|| {
        let under_test = running_under_test();
        let filter = EnvFilter::builder()
            .with_default_directive(default_level(under_test).into())
            .from_env_lossy();

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(true)
            .with_span_events(FmtSpan::NONE)
            .compact();

        let installed = if under_test {
            builder.with_test_writer().try_init()
        } else {
            builder.with_writer(std::io::stderr).try_init()
        };

        if let Err(e) = installed {
            eprintln!("Failed to initialize tracing: {}", e);
        }
    });
}

fn running_under_test() -> bool {
    std::env::var_os("NEXTEST").is_some() || std::env::var_os("CARGO_TARGET_TMPDIR").is_some()
}

const fn default_level(under_test: bool) -> LevelFilter {
    if under_test {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}
