//! The environment a recorder attaches to.

use std::sync::{Arc, OnceLock};

use crate::console::Console;
use crate::events::ErrorEvents;
use crate::host_console::host_console;
use crate::trace::{BacktraceFrameParser, FrameParser};

/// Console, uncaught-error surface and frame parser of one environment.
#[derive(Clone)]
pub struct Host {
    pub console: Arc<Console>,
    /// `None` when the environment has no uncaught-error notifications.
    pub errors: Option<Arc<ErrorEvents>>,
    pub frame_parser: Arc<dyn FrameParser>,
}

impl Host {
    /// Builds a host around `console` with no error surface and the
    /// backtrace frame parser.
    pub fn new(console: Arc<Console>) -> Self {
        Self {
            console,
            errors: None,
            frame_parser: Arc::new(BacktraceFrameParser),
        }
    }

    /// Attaches an uncaught-error surface.
    pub fn with_errors(mut self, errors: Arc<ErrorEvents>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Replaces the default backtrace parser.
    pub fn with_frame_parser(mut self, parser: Arc<dyn FrameParser>) -> Self {
        self.frame_parser = parser;
        self
    }

    /// The process-wide host: a printing console and a global error surface.
    pub fn ambient() -> &'static Host {
        static AMBIENT: OnceLock<Host> = OnceLock::new();
        AMBIENT.get_or_init(|| {
            Host::new(Arc::new(host_console())).with_errors(Arc::new(ErrorEvents::new()))
        })
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("console", &self.console)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}
