//! Identifier rules shared by descriptor validation and code generation

/// Strict and reserved Rust keywords.
pub const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

pub fn is_keyword(s: &str) -> bool {
    RUST_KEYWORDS.contains(&s)
}

/// ASCII identifier that is not a keyword: `[A-Za-z_][A-Za-z0-9_]*`, and not `_` alone.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let first_ok = match chars.next() {
        Some(c) => c.is_ascii_alphabetic() || c == '_',
        None => false,
    };
    first_ok && s != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !is_keyword(s)
}

/// Path segments allowed only in first position of a type path.
const PATH_ROOTS: &[&str] = &["crate", "self", "super"];

/// A plain Rust type path such as `String`, `crate::ImagePath` or
/// `::std::path::PathBuf`. Generic arguments are not accepted.
pub fn is_type_path(s: &str) -> bool {
    let (absolute, path) = match s.strip_prefix("::") {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let segments: Vec<&str> = path.split("::").collect();
    let last = segments.len() - 1;
    segments.iter().enumerate().all(|(index, segment)| {
        is_identifier(segment)
            || (index == 0 && index != last && !absolute && PATH_ROOTS.contains(segment))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("ImageValue"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("Image2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("_"));
        assert!(!is_identifier("2Image"));
        assert!(!is_identifier("Image-Value"));
        assert!(!is_identifier("Bild\u{e4}"));
        assert!(!is_identifier("struct"));
        assert!(!is_identifier("Self"));
    }

    #[test]
    fn test_type_paths() {
        assert!(is_type_path("String"));
        assert!(is_type_path("crate::ImagePath"));
        assert!(is_type_path("::std::path::PathBuf"));
        assert!(is_type_path("super::ids::CityId"));
        assert!(!is_type_path(""));
        assert!(!is_type_path("crate"));
        assert!(!is_type_path("::crate::X"));
        assert!(!is_type_path("a::::b"));
        assert!(!is_type_path("Vec<u8>"));
        assert!(!is_type_path("models::type"));
        assert!(!is_type_path("Path\nfn x() {}"));
    }
}
