//! Resource model: numbered image identifiers, the append-only resource
//! list, and the base location they live under.

use std::fmt;
use std::path::PathBuf;

/// A discovered image, named `{index}.{ext}` under the gallery base.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    index: u32,
    ext: String,
}

impl ResourceId {
    pub fn new(index: u32, ext: &str) -> Self {
        Self {
            index,
            ext: ext.to_string(),
        }
    }

    /// 1-based probe index.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn ext(&self) -> &str {
        &self.ext
    }

    /// File name within the base (`"7.webp"`).
    pub fn name(&self) -> String {
        format!("{}.{}", self.index, self.ext)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.index, self.ext)
    }
}

/// Discovered resources in discovery order.
///
/// Discovery order is display order. The list is only ever appended to;
/// it is never reordered or deduplicated.
#[derive(Debug, Default, Clone)]
pub struct ResourceList {
    items: Vec<ResourceId>,
}

impl ResourceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append and return the position of the new entry.
    pub fn push(&mut self, id: ResourceId) -> usize {
        self.items.push(id);
        self.items.len() - 1
    }

    pub fn get(&self, position: usize) -> Option<&ResourceId> {
        self.items.get(position)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceId> {
        self.items.iter()
    }

    /// Drop every entry. Only a fresh discovery pass does this.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a> IntoIterator for &'a ResourceList {
    type Item = &'a ResourceId;
    type IntoIter = std::slice::Iter<'a, ResourceId>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Where the numbered images live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Base {
    /// Local directory.
    Dir(PathBuf),
    /// URL prefix, stored without a trailing slash.
    Url(String),
}

impl Base {
    /// Classify a base string: `http://` / `https://` prefixes are URLs,
    /// everything else is a directory.
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Base::Url(s.trim_end_matches('/').to_string())
        } else {
            Base::Dir(PathBuf::from(s))
        }
    }

    /// Full location of a resource: a URL or a filesystem path.
    pub fn locate(&self, id: &ResourceId) -> String {
        match self {
            Base::Dir(dir) => dir.join(id.name()).display().to_string(),
            Base::Url(prefix) => format!("{prefix}/{}", id.name()),
        }
    }

    /// Local file path of a resource, if the base is a directory.
    pub fn local_path(&self, id: &ResourceId) -> Option<PathBuf> {
        match self {
            Base::Dir(dir) => Some(dir.join(id.name())),
            Base::Url(_) => None,
        }
    }

    /// Short label for the status bar.
    pub fn display_name(&self) -> String {
        match self {
            Base::Dir(dir) => dir.display().to_string(),
            Base::Url(prefix) => prefix.clone(),
        }
    }
}
