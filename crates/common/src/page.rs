//! Page discovery
//!
//! A `Page` identifies one HTML document under test. The full set is
//! discovered once per invocation by scanning the site root; the resulting
//! `PageSet` is immutable and passed by value into catalog expansion.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Language variant of a page.
///
/// The site publishes French pages by default; an English variant carries an
/// `-en` suffix before the extension (`a-propos.html` / `a-propos-en.html`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Fr,
    En,
}

/// One HTML document under test, keyed by its path relative to the site root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Page {
    /// Path relative to the site root, e.g. `index.html`
    pub path: String,

    /// Language variant derived from the file name
    pub language: Language,
}

impl Page {
    fn from_relative_path(path: &Path) -> Self {
        let language = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| s.ends_with("-en"))
            .map_or(Language::Fr, |_| Language::En);

        Self {
            path: path.to_string_lossy().replace('\\', "/"),
            language,
        }
    }
}

/// The immutable set of pages discovered under one site root.
#[derive(Debug, Clone)]
pub struct PageSet {
    root: PathBuf,
    pages: Vec<Page>,
}

impl PageSet {
    /// Scan `root` for HTML documents.
    ///
    /// Only `*.html` files are considered pages; assets (CSS, JS, locales,
    /// images) are served by the fixture server but never targeted by checks
    /// directly.
    pub fn discover(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::SiteRootNotFound(root.to_path_buf()));
        }

        let mut pages = Vec::new();
        for entry in walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "html")
                    .unwrap_or(false)
            })
        {
            let rel = entry
                .path()
                .strip_prefix(root)
                .expect("walkdir yields paths under root");
            pages.push(Page::from_relative_path(rel));
        }

        if pages.is_empty() {
            return Err(Error::NoPages(root.to_path_buf()));
        }

        pages.sort();
        debug!("Discovered {} page(s) under {}", pages.len(), root.display());

        Ok(Self {
            root: root.to_path_buf(),
            pages,
        })
    }

    /// The site root this set was discovered from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Look up a page by its relative path.
    pub fn get(&self, path: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.path == path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Read a page's markup. Pages are re-read per check run, never cached,
    /// so static checks always see the file as it is on disk.
    pub fn read(&self, page: &Page) -> Result<String> {
        Ok(fs::read_to_string(self.root.join(&page.path))?)
    }

    /// Whether a relative link from any page resolves to a file in the tree.
    ///
    /// Root-absolute hrefs (`/index.html`) are resolved against the site
    /// root, not the filesystem root.
    pub fn resolves(&self, href: &str) -> bool {
        self.root.join(href.trim_start_matches('/')).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site_with(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            let path = dir.path().join(f);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, "<html></html>").unwrap();
        }
        dir
    }

    #[test]
    fn test_discover_only_html() {
        let dir = site_with(&["index.html", "styles.css", "main.js", "contact.html"]);
        let set = PageSet::discover(dir.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("index.html"));
        assert!(set.contains("contact.html"));
        assert!(!set.contains("styles.css"));
    }

    #[test]
    fn test_language_variant_from_suffix() {
        let dir = site_with(&["a-propos.html", "a-propos-en.html"]);
        let set = PageSet::discover(dir.path()).unwrap();
        assert_eq!(set.get("a-propos.html").unwrap().language, Language::Fr);
        assert_eq!(set.get("a-propos-en.html").unwrap().language, Language::En);
    }

    #[test]
    fn test_discovery_is_sorted() {
        let dir = site_with(&["videos.html", "articles.html", "index.html"]);
        let set = PageSet::discover(dir.path()).unwrap();
        let paths: Vec<_> = set.pages().iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["articles.html", "index.html", "videos.html"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let err = PageSet::discover(Path::new("/nonexistent/site")).unwrap_err();
        assert!(matches!(err, Error::SiteRootNotFound(_)));
    }

    #[test]
    fn test_empty_tree_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PageSet::discover(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NoPages(_)));
    }

    #[test]
    fn test_resolves_assets() {
        let dir = site_with(&["index.html"]);
        fs::write(dir.path().join("theme.js"), "// js").unwrap();
        let set = PageSet::discover(dir.path()).unwrap();
        assert!(set.resolves("theme.js"));
        assert!(!set.resolves("missing.js"));
    }

    #[test]
    fn test_resolves_root_absolute_href() {
        let dir = site_with(&["index.html"]);
        let set = PageSet::discover(dir.path()).unwrap();
        assert!(set.resolves("/index.html"));
        assert!(!set.resolves("/a-porpos.html"));
    }
}
