//! Prefix-addressed registry of input sources

use smallvec::SmallVec;

use crate::error::InputError;
use crate::input::{InputQuery, InputReading, InputSource, SourceRef};

/// A source together with the prefix it answers for.
struct MountedSource {
    source_ref: SourceRef,
    source: Box<dyn InputSource>,
}

/// Input sources in registration order.
///
/// Queries pick the first source whose prefix the full path starts with, so
/// overlapping prefixes must be registered most-specific first.
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<MountedSource>,
}

impl SourceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `source` at `prefix`. A source already at `prefix` is replaced in place.
    pub fn mount(&mut self, prefix: impl Into<String>, source: Box<dyn InputSource>) {
        let prefix = prefix.into();
        let source_ref = SourceRef::new(&prefix, source.name());
        if let Some(existing) = self
            .sources
            .iter_mut()
            .find(|m| m.source_ref.prefix() == prefix)
        {
            log::debug!("replacing input source at {prefix}");
            existing.source_ref = source_ref;
            existing.source = source;
            return;
        }
        log::debug!("mounting input source {source_ref}");
        self.sources.push(MountedSource { source_ref, source });
    }

    /// Remove the source mounted at exactly `prefix`.
    pub fn unmount(&mut self, prefix: &str) -> Option<Box<dyn InputSource>> {
        let index = self
            .sources
            .iter()
            .position(|m| m.source_ref.prefix() == prefix)?;
        Some(self.sources.remove(index).source)
    }

    /// Poll every source in registration order.
    ///
    /// Failures are logged and collected; a failing source never prevents the
    /// others from being polled.
    pub fn poll_all(&mut self) -> SmallVec<[InputError; 2]> {
        let mut failures = SmallVec::new();
        for mounted in &mut self.sources {
            if let Err(error) = mounted.source.poll() {
                log::warn!("input source {} failed to poll: {error}", mounted.source_ref);
                failures.push(InputError::Source {
                    prefix: mounted.source_ref.prefix().to_string(),
                    error,
                });
            }
        }
        failures
    }

    /// Send a haptic pulse to the source mounted at `prefix`.
    pub fn send_haptic_pulse(&mut self, prefix: &str, milliseconds: u32) -> bool {
        self.sources
            .iter_mut()
            .find(|m| m.source_ref.prefix() == prefix)
            .is_some_and(|m| m.source.send_haptic_pulse(milliseconds))
    }

    /// Iterate over mounted sources in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&SourceRef, &dyn InputSource)> + '_ {
        self.sources
            .iter()
            .map(|m| (&m.source_ref, m.source.as_ref()))
    }

    /// Number of mounted sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no source is mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl InputQuery for SourceRegistry {
    fn try_query_input_path(&self, full_path: &str) -> Result<InputReading, InputError> {
        let Some((mounted, relative)) = self.sources.iter().find_map(|m| {
            full_path
                .strip_prefix(m.source_ref.prefix())
                .map(|relative| (m, relative))
        }) else {
            return Ok(InputReading::default());
        };

        let reading = mounted
            .source
            .query_input_path(relative)
            .map_err(|error| InputError::Source {
                prefix: mounted.source_ref.prefix().to_string(),
                error,
            })?;

        Ok(InputReading {
            active: reading.active,
            value: reading.value,
            source: Some(mounted.source_ref.clone()),
        })
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sources.iter().map(|m| &m.source_ref))
            .finish()
    }
}
