//! The [`Converter`] trait: one pluggable backend per media kind.
//!
//! The dispatcher only ever sees this interface, so backends can be swapped
//! (or faked in tests) without touching batch logic.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use mf_core::{ConversionError, MediaKind, OutputFormat};

/// Converts a single file of one media kind.
///
/// Implementations must be safe to call concurrently on different
/// input/output pairs.
#[async_trait]
pub trait Converter: Send + Sync {
    /// A short, human-readable name (e.g. "image").
    fn name(&self) -> &'static str;

    /// The media kind this converter handles.
    fn kind(&self) -> MediaKind;

    /// Whether `format` is a valid target for this converter.
    fn supports(&self, format: OutputFormat) -> bool {
        self.kind().supports(format)
    }

    /// Read `input`, encode it as `format`, and write `output`.
    ///
    /// An existing file at `output` is overwritten. On failure, any partial
    /// output is left where the backend put it.
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: OutputFormat,
    ) -> Result<(), ConversionError>;
}

/// Maps each media kind to its converter.
#[derive(Default, Clone)]
pub struct ConverterRegistry {
    converters: HashMap<MediaKind, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `converter` under its own kind, replacing any previous one.
    pub fn register(&mut self, converter: Arc<dyn Converter>) -> &mut Self {
        self.converters.insert(converter.kind(), converter);
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, converter: impl Converter + 'static) -> Self {
        self.register(Arc::new(converter));
        self
    }

    /// The converter for `kind`, if one is registered.
    pub fn get(&self, kind: MediaKind) -> Option<Arc<dyn Converter>> {
        self.converters.get(&kind).cloned()
    }

    /// Kinds with a registered converter, in [`MediaKind::ALL`] order.
    pub fn kinds(&self) -> Vec<MediaKind> {
        MediaKind::ALL
            .into_iter()
            .filter(|kind| self.converters.contains_key(kind))
            .collect()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self
            .kinds()
            .into_iter()
            .filter_map(|kind| self.converters.get(&kind).map(|c| (kind, c.name())))
            .collect();
        f.debug_struct("ConverterRegistry")
            .field("converters", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop(MediaKind);

    #[async_trait]
    impl Converter for Noop {
        fn name(&self) -> &'static str {
            "noop"
        }

        fn kind(&self) -> MediaKind {
            self.0
        }

        async fn convert(
            &self,
            _: &Path,
            _: &Path,
            _: OutputFormat,
        ) -> Result<(), ConversionError> {
            Ok(())
        }
    }

    #[test]
    fn register_by_kind() {
        let registry = ConverterRegistry::new()
            .with(Noop(MediaKind::Video))
            .with(Noop(MediaKind::Image));
        assert_eq!(registry.kinds(), vec![MediaKind::Image, MediaKind::Video]);
        assert!(registry.get(MediaKind::Audio).is_none());
        assert_eq!(registry.get(MediaKind::Video).unwrap().kind(), MediaKind::Video);
    }

    #[test]
    fn default_supports_follows_catalog() {
        let noop = Noop(MediaKind::Audio);
        assert!(noop.supports(OutputFormat::Flac));
        assert!(!noop.supports(OutputFormat::Png));
    }
}
