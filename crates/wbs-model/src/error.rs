//! Errors raised while reading dump files

/// Failure to turn dump XML into a document
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The text is not well-formed XML
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The document element is not the one expected
    #[error("expected <{expected}> document element, found <{found}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },
}
