//! Utility functions for output paths

/// Characters that cannot appear in a filename on common platforms
const RESERVED: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Make an arbitrary string safe to embed in a filename
///
/// Path separators, characters reserved on Windows and control characters are
/// replaced by `_`. Everything else, including non-ASCII text, is kept.
///
/// # Examples
///
/// ```
/// use corpno_dl::utils::sanitize_file_component;
///
/// assert_eq!(sanitize_file_component("A/B Holdings"), "A_B Holdings");
/// assert_eq!(sanitize_file_component("株式会社"), "株式会社");
/// ```
#[must_use]
pub fn sanitize_file_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_control() || RESERVED.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    // "." and ".." would turn into directory references
    if cleaned.chars().all(|c| c == '.') {
        cleaned.replace('.', "_")
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_and_reserved_characters_are_replaced() {
        assert_eq!(sanitize_file_component("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_file_component("what?*"), "what__");
        assert_eq!(sanitize_file_component("x\ny\tz"), "x_y_z");
    }

    #[test]
    fn ordinary_names_are_untouched() {
        assert_eq!(sanitize_file_component("20200507-20200531"), "20200507-20200531");
        assert_eq!(sanitize_file_component("Example Co., Ltd."), "Example Co., Ltd.");
        assert_eq!(sanitize_file_component("トヨタ自動車"), "トヨタ自動車");
    }

    #[test]
    fn dot_only_names_cannot_escape_the_directory() {
        assert_eq!(sanitize_file_component(".."), "__");
        assert_eq!(sanitize_file_component("."), "_");
    }
}
