use super::{Format, SourceKind, Strategy};
use std::path::Path;
use url::Url;

/// Classifies a definition string into a loading strategy.
///
/// First match wins:
/// 1. a well-formed `http`/`https` URL is fetched remotely
/// 2. a path naming an existing file is read from disk
/// 3. anything else is the document text itself
///
/// Nothing is memoized; the file system is probed on every call.
pub fn classify(definition: &str, format: Format) -> Strategy {
    let kind = if is_remote(definition) {
        SourceKind::Remote
    } else if Path::new(definition).is_file() {
        SourceKind::File
    } else {
        SourceKind::Inline
    };

    let strategy = Strategy::new(kind, format);
    tracing::debug!(strategy = %strategy, "Classified definition reference");
    strategy
}

fn is_remote(definition: &str) -> bool {
    match Url::parse(definition) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}
