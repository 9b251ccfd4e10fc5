use butler_fs::{NormalizedPath, RelativePath};
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalized_path_has_no_backslashes_or_double_slashes(s in "\\PC*") {
        let path = NormalizedPath::new(&s);
        let as_str = path.as_str();

        prop_assert!(!as_str.contains('\\'));

        let is_network = as_str.starts_with("//") && !as_str.starts_with("///");
        let rest = if is_network { &as_str[2..] } else { as_str };
        prop_assert!(!rest.contains("//"));

        let roundtripped = NormalizedPath::new(path.to_native());
        prop_assert_eq!(path, roundtripped);
    }

    #[test]
    fn relative_path_never_escapes(segments in prop::collection::vec("[a-z0-9_.]{0,6}", 1..6)) {
        let raw = segments.join("/");
        if let Ok(rel) = RelativePath::new(&raw) {
            prop_assert!(!rel.as_str().starts_with('/'));
            prop_assert!(!rel.as_str().split('/').any(|s| s == ".." || s == "." || s.is_empty()));
            // Parsing is idempotent
            let reparsed = RelativePath::new(rel.as_str()).unwrap();
            prop_assert_eq!(reparsed, rel);
        }
    }
}
