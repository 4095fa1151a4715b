use std::cell::Cell;
use std::fmt::Arguments;

use cfg_if::cfg_if;
use once_cell::sync::OnceCell;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

static INIT: OnceCell<()> = OnceCell::new();

/// Installs the global subscriber. Safe to call more than once.
pub fn init() {
    INIT.get_or_init(install);
}

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        fn install() {
            // Log to browser console via tracing-wasm
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"));

            let wasm_layer = tracing_wasm::WASMLayer::new(tracing_wasm::WASMLayerConfig::default());

            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(wasm_layer)
                .try_init();

            // Panics with stacktrace
            #[cfg(feature = "console_error_panic_hook")]
            console_error_panic_hook::set_once();
        }
    } else {
        use tracing_subscriber::fmt;
        use std::io;

        fn install() {
            // Env filter: use RUST_LOG or default to info
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"));

            let console_layer = fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_level(true)
                .compact();

            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .try_init();
        }
    }
}

/// Per-controller message gate. Informational messages only pass while verbose;
/// warnings always do.
#[derive(Debug, Default)]
pub struct Logger {
    verbose: Cell<bool>,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose: Cell::new(verbose),
        }
    }

    pub fn set_verbose(&self, verbose: bool) {
        self.verbose.set(verbose);
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose.get()
    }

    /// Returns whether the message was emitted
    pub fn info(&self, args: Arguments<'_>) -> bool {
        if self.verbose.get() {
            tracing::info!("{}", args);
        }
        self.verbose.get()
    }

    pub fn warn(&self, args: Arguments<'_>) {
        tracing::warn!("{}", args);
    }
}
