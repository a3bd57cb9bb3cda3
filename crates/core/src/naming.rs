#![forbid(unsafe_code)]

use std::collections::BTreeSet;

/// How an SKU shows up in file and folder names.
///
/// The rename coordinator asks the policy for every file it finds; `None`
/// means the file is not tied to the SKU and stays put.
pub trait SkuNamingPolicy {
    fn derive_renamed_filename(&self, old_sku: &str, new_sku: &str, filename: &str) -> Option<String>;

    fn derive_folder_name(&self, old_sku: &str, new_sku: &str, folder: &str) -> Option<String> {
        self.derive_renamed_filename(old_sku, new_sku, folder)
    }
}

/// Names that literally start with the SKU get the new SKU swapped in.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrefixSkuPolicy;

impl SkuNamingPolicy for PrefixSkuPolicy {
    fn derive_renamed_filename(&self, old_sku: &str, new_sku: &str, filename: &str) -> Option<String> {
        let old_sku = old_sku.trim();
        let new_sku = new_sku.trim();
        if old_sku.is_empty() || new_sku.is_empty() || old_sku == new_sku {
            return None;
        }
        let rest = filename.strip_prefix(old_sku)?;
        Some(format!("{new_sku}{rest}"))
    }
}

/// Next free `<SKU>-<NNN><ext>` name among `existing`.
///
/// Matching is case-insensitive; gaps are not reused, the sequence always
/// continues after the highest index present.
pub fn next_sequenced_name<I, S>(existing: I, sku: &str, ext: &str) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let sku = sku.trim();
    if sku.is_empty() {
        return None;
    }
    let prefix = format!("{}-", sku.to_ascii_lowercase());
    let ext_lower = ext.to_ascii_lowercase();
    let mut max_index = 0u32;
    for name in existing {
        let lowered = name.as_ref().to_ascii_lowercase();
        let Some(rest) = lowered.strip_prefix(&prefix) else {
            continue;
        };
        let Some(digits) = rest.strip_suffix(&ext_lower) else {
            continue;
        };
        if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if let Ok(index) = digits.parse::<u32>() {
            max_index = max_index.max(index);
        }
    }
    Some(format!("{sku}-{:03}{ext}", max_index + 1))
}

/// Keeps `filename` if it is free, otherwise appends `-NNN` before the
/// extension until it is.
pub fn unique_filename<I, S>(existing: I, filename: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let taken: BTreeSet<String> = existing.into_iter().map(|s| s.as_ref().to_string()).collect();
    if !taken.contains(filename) {
        return filename.to_string();
    }
    let (stem, ext) = split_extension(filename);
    let mut index = 1u32;
    loop {
        let candidate = format!("{stem}-{index:03}{ext}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

/// Splits `name.ext` into `("name", ".ext")`. Dotfiles have no extension.
pub fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(0) | None => (filename, ""),
        Some(pos) => filename.split_at(pos),
    }
}
