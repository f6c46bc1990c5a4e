//! Test-case naming rules.

/// Required prefix of every directly runnable test-case name.
pub const TEST_CASE_PREFIX: &str = "test_";

/// Maximum length of a derived name that may end up in a file path.
pub const MAX_FILENAME_LEN: usize = 255;

/// A name is a valid test-case identifier only if it is at least five
/// characters long and starts with `test_`.
pub fn is_valid_test_name(name: &str) -> bool {
    name.len() >= 5 && name.starts_with(TEST_CASE_PREFIX)
}

/// Truncate a derived test/file name to [`MAX_FILENAME_LEN`] bytes,
/// backing off to the nearest character boundary.
pub fn truncate_filename(name: &str) -> &str {
    if name.len() <= MAX_FILENAME_LEN {
        return name;
    }
    let mut end = MAX_FILENAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}
