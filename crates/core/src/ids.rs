#![forbid(unsafe_code)]

use std::path::{Component, Path, PathBuf};

/// Identity of a product in the registry: `(category, folder name)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductKey {
    category: String,
    folder: String,
}

impl ProductKey {
    /// Builds a key from caller input. The folder is sanitized into a
    /// directory name; a category that is not already one plain path
    /// segment is rejected, so each part maps onto exactly one segment.
    pub fn try_new(category: &str, folder: &str) -> Result<Self, KeyError> {
        let category = safe_path_component(category);
        if category.is_empty() {
            return Err(KeyError::EmptyCategory);
        }
        if !is_single_segment(&category) {
            return Err(KeyError::InvalidCategory);
        }
        let folder = sanitize_folder_name(&safe_path_component(folder));
        if folder.is_empty() {
            return Err(KeyError::EmptyFolder);
        }
        if !is_single_segment(&folder) {
            return Err(KeyError::InvalidFolder);
        }
        Ok(Self { category, folder })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn variant(&self, color: &str, size: &str) -> VariantKey {
        VariantKey {
            product: self.clone(),
            color: color.trim().to_string(),
            size: size.trim().to_string(),
        }
    }
}

impl std::fmt::Display for ProductKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.category, self.folder)
    }
}

/// One stock-keeping unit: a product plus a colour and size.
///
/// Colour and size may be empty; products without variants still carry one
/// implicit `("", "")` variant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    product: ProductKey,
    color: String,
    size: String,
}

impl VariantKey {
    pub fn try_new(category: &str, folder: &str, color: &str, size: &str) -> Result<Self, KeyError> {
        Ok(ProductKey::try_new(category, folder)?.variant(color, size))
    }

    pub fn product(&self) -> &ProductKey {
        &self.product
    }

    pub fn category(&self) -> &str {
        self.product.category()
    }

    pub fn folder(&self) -> &str {
        self.product.folder()
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn with_product(&self, product: ProductKey) -> Self {
        Self {
            product,
            color: self.color.clone(),
            size: self.size.clone(),
        }
    }
}

impl std::fmt::Display for VariantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}|{}]", self.product, self.color, self.size)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyError {
    EmptyCategory,
    EmptyFolder,
    InvalidCategory,
    InvalidFolder,
}

impl KeyError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::EmptyCategory => "category must not be empty",
            Self::EmptyFolder => "product folder must not be empty",
            Self::InvalidCategory => "category must be a single directory name",
            Self::InvalidFolder => "product folder must be a single directory name",
        }
    }
}

/// Strips parent-directory markers from a single user-supplied name.
pub fn safe_path_component(name: &str) -> String {
    name.replace("..", "").trim().to_string()
}

fn is_single_segment(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Turns free text into a usable directory name: separators become `-` and
/// whitespace runs collapse to one space.
pub fn sanitize_folder_name(name: &str) -> String {
    let cleaned = name.replace(['/', '\\'], "-");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validates a relative path inside a product directory.
///
/// Absolute paths, drive prefixes and any `..` segment are rejected outright
/// rather than cleaned up.
pub fn safe_rel_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() || value.starts_with('/') || value.starts_with('\\') || value.contains(':') {
        return None;
    }
    let normalized = value.replace('\\', "/");
    let mut out = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        return None;
    }
    Some(out)
}
