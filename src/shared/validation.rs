use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Characters that may not appear in a stored filename.
    /// Everything outside `[A-Za-z0-9._-]` is replaced with an underscore.
    /// - Safe: "sunset.png", "family-photo_2.jpeg"
    /// - Rewritten: "my photo.png" -> "my_photo.png", "café.jpg" -> "caf_.jpg"
    pub static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
}

/// Reduce a client-supplied filename to a safe basename.
///
/// Path components are stripped first ("/" and "\" both count as separators),
/// then every unsafe character in the remaining segment is replaced.
pub fn sanitize_filename(original: &str) -> String {
    let basename = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original);

    UNSAFE_FILENAME_CHARS.replace_all(basename, "_").into_owned()
}
