//! Path and URI conversion helpers.

use std::path::Path;

use lsp_types::Uri;
use url::Url;

use crate::errors::ClientError;

/// Converts an absolute path to a `file://` URI.
///
/// # Errors
///
/// Returns [`ClientError::Uri`] for relative paths or paths the URI parser
/// rejects.
pub fn path_to_uri(path: &Path) -> Result<Uri, ClientError> {
    let invalid = || ClientError::Uri {
        path: path.display().to_string(),
    };
    let url = Url::from_file_path(path).map_err(|()| invalid())?;
    url.as_str().parse().map_err(|_| invalid())
}

/// Converts a `file://` URI back to a local path.
#[must_use]
pub fn uri_to_path(uri: &Uri) -> Option<std::path::PathBuf> {
    Url::parse(uri.as_str()).ok()?.to_file_path().ok()
}

/// Scheme of `uri`, lowercased, if it parses as an absolute URL.
#[must_use]
pub fn uri_scheme(uri: &Uri) -> Option<String> {
    Url::parse(uri.as_str())
        .ok()
        .map(|url| url.scheme().to_owned())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn converts_absolute_path() {
        let uri = path_to_uri(Path::new("/proj/main.bdm")).expect("conversion failed");

        assert_eq!(uri.as_str(), "file:///proj/main.bdm");
        assert_eq!(uri_scheme(&uri).as_deref(), Some("file"));
    }

    #[rstest]
    fn percent_encodes_spaces_and_round_trips() {
        let path = Path::new("/path with spaces/a.bdm");
        let uri = path_to_uri(path).expect("conversion failed");

        assert_eq!(uri.as_str(), "file:///path%20with%20spaces/a.bdm");
        assert_eq!(uri_to_path(&uri).as_deref(), Some(path));
    }

    #[rstest]
    fn rejects_relative_paths() {
        let error = path_to_uri(Path::new("relative/a.bdm")).expect_err("should fail");

        assert!(matches!(error, ClientError::Uri { .. }));
    }

    #[rstest]
    fn reports_untitled_scheme() {
        let uri: Uri = "untitled:Untitled-1".parse().expect("valid uri");

        assert_eq!(uri_scheme(&uri).as_deref(), Some("untitled"));
        assert!(uri_to_path(&uri).is_none());
    }

    #[rstest]
    #[case("FILE:///proj/main.bdm", "file")]
    #[case("vscode-notebook-cell:/proj/a.ipynb#X1", "vscode-notebook-cell")]
    fn scheme_comes_from_the_url_parser(#[case] raw: &str, #[case] expected: &str) {
        let uri: Uri = raw.parse().expect("valid uri reference");

        assert_eq!(uri_scheme(&uri).as_deref(), Some(expected));
    }
}
