/// Which adapter family a probe should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserChoice {
    /// Try the full adapter chain.
    #[default]
    Auto,
    /// The in-house container parsers and sniffers only.
    InHouse,
    /// Only the ISO-BMFF box parser.
    IsoBmff,
    /// Delegated third-party adapters. None are registered in this build;
    /// the router that forwards to external libraries lives outside this
    /// crate.
    Delegated,
}

/// Options for [`crate::probe_media_info`].
#[derive(Default)]
pub struct ProbeOptions<'a> {
    /// Adapter selection.
    pub parser: ParserChoice,
    /// Progress callback; called with a 0-100 percentage as adapters are
    /// attempted.
    pub on_progress: Option<Box<dyn FnMut(u8) + 'a>>,
}

impl std::fmt::Debug for ProbeOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeOptions")
            .field("parser", &self.parser)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}
