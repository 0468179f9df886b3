//! Document URI allocation.
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Hands out `/documents/doc_{n}_{suffix}.json` URIs.
///
/// `n` comes from a process-wide atomic counter and is unique per
/// allocator even under concurrent use. The eight hex characters of
/// `suffix` are random and only guard against collisions across
/// allocator instances or restarts.
#[derive(Debug, Default)]
pub struct IdAllocator {
    counter: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the caller's URI unchanged, or allocate a fresh one.
    ///
    /// No uniqueness check is made against earlier writes; the last
    /// write to a URI wins.
    ///
    /// ```rust
    /// use docingest::IdAllocator;
    ///
    /// let ids = IdAllocator::new();
    /// assert_eq!(ids.resolve(Some("/customers/1.json")), "/customers/1.json");
    /// assert!(ids.resolve(None).starts_with("/documents/doc_1_"));
    /// ```
    pub fn resolve(&self, requested: Option<&str>) -> String {
        match requested {
            Some(uri) if !uri.is_empty() => uri.to_string(),
            _ => self.next_uri(),
        }
    }

    /// Allocate a new URI unconditionally.
    pub fn next_uri(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let suffix = Uuid::new_v4().simple().to_string();
        format!("/documents/doc_{n}_{}.json", &suffix[..8])
    }

    /// Number of URIs allocated so far.
    pub fn allocated(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

/// Split an allocated URI into its counter and suffix.
///
/// Returns `None` for URIs this allocator could not have produced.
pub fn parse_allocated(uri: &str) -> Option<(u64, &str)> {
    let rest = uri.strip_prefix("/documents/doc_")?.strip_suffix(".json")?;
    let (n, suffix) = rest.split_once('_')?;
    let valid_suffix =
        suffix.len() == 8 && suffix.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !valid_suffix {
        return None;
    }
    Some((n.parse().ok()?, suffix))
}
