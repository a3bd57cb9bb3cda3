#![forbid(unsafe_code)]

pub const CATEGORY_PREFIXES: &[(&str, &str)] = &[
    ("Automotive", "GT-AUT"),
    ("Bookish & Stationery", "GT-BKS"),
    ("B2B", "GT-B2B"),
    ("Gaming & Tech", "GT-TCH"),
    ("Health & Medical", "GT-HLT"),
    ("Home & Living", "GT-HOM"),
    ("Jewelry & Accessories", "GT-JWL"),
    ("Office & Storage", "GT-OFF"),
    ("Tools & Workshop", "GT-TLW"),
    ("Toys & Games", "GT-TOY"),
    ("Uncategorized", "GT-UNC"),
];

pub fn sku_prefix(category: &str) -> Option<&'static str> {
    let category = category.trim();
    CATEGORY_PREFIXES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, prefix)| *prefix)
}

/// Sequence number of an SKU-led name such as `GT-AUT-00012 - Cup holder`
/// or a bare `GT-AUT-00012`.
pub fn sku_number(prefix: &str, name: &str) -> Option<u32> {
    let head = name.split(" - ").next().unwrap_or(name).trim();
    let digits = head.strip_prefix(prefix)?.strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Allocates the SKU after the highest one seen among `taken`.
pub fn next_sku<I, S>(prefix: &str, taken: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let max = taken
        .into_iter()
        .filter_map(|name| sku_number(prefix, name.as_ref()))
        .max()
        .unwrap_or(0);
    format!("{prefix}-{:05}", max + 1)
}
