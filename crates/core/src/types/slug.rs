//! URL slugs.

/// Turn a display name into a lowercase, hyphen-separated slug.
///
/// ASCII letters and digits are kept; every other run of characters becomes
/// a single hyphen. Leading and trailing hyphens are dropped.
///
/// ```
/// use tokoku_core::slugify;
///
/// assert_eq!(slugify("Sayur & Buah Segar"), "sayur-buah-segar");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Minuman"), "minuman");
        assert_eq!(slugify("  Bumbu -- Dapur  "), "bumbu-dapur");
        assert_eq!(slugify("Snack 2024!"), "snack-2024");
        assert_eq!(slugify("!!!"), "");
    }
}
