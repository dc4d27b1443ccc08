//! Document selector and the set of documents announced to the server.

use std::collections::HashSet;

use birdee_config::LANGUAGE_ID;
use lsp_types::Uri;

use crate::uri::uri_scheme;

/// Which documents are forwarded to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSelector {
    scheme: String,
    language: String,
}

impl DocumentSelector {
    /// Selector matching `scheme` and `language` exactly.
    #[must_use]
    pub fn new(scheme: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            language: language.into(),
        }
    }

    /// Birdee sources stored on disk.
    #[must_use]
    pub fn birdee() -> Self {
        Self::new("file", LANGUAGE_ID)
    }

    /// Scheme accepted by the selector.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Language identifier accepted by the selector.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// URI schemes compare case-insensitively; language identifiers do not.
    #[must_use]
    pub fn matches(&self, uri: &Uri, language_id: &str) -> bool {
        language_id == self.language
            && uri_scheme(uri).is_some_and(|scheme| scheme.eq_ignore_ascii_case(&self.scheme))
    }
}

impl Default for DocumentSelector {
    fn default() -> Self {
        Self::birdee()
    }
}

/// URIs whose `didOpen` reached the server.
#[derive(Debug, Default)]
pub(crate) struct OpenDocuments {
    selector: DocumentSelector,
    open: HashSet<String>,
}

impl OpenDocuments {
    pub(crate) fn new(selector: DocumentSelector) -> Self {
        Self {
            selector,
            open: HashSet::new(),
        }
    }

    pub(crate) fn accepts(&self, uri: &Uri, language_id: &str) -> bool {
        self.selector.matches(uri, language_id)
    }

    pub(crate) fn track(&mut self, uri: &Uri) {
        self.open.insert(uri.as_str().to_owned());
    }

    pub(crate) fn is_tracked(&self, uri: &Uri) -> bool {
        self.open.contains(uri.as_str())
    }

    /// Stops tracking `uri`, returning whether it was tracked.
    pub(crate) fn release(&mut self, uri: &Uri) -> bool {
        self.open.remove(uri.as_str())
    }
}
