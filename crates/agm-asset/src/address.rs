//! Address simplification
//!
//! Promoted assets get a short address derived from their path. The
//! simplifier is a pure, total function: any input string yields an address.

/// Maps a raw asset path to its canonical load address
pub trait AddressSimplifier {
    /// Canonical address for `raw_path`
    fn simplify(&self, raw_path: &str) -> String;
}

impl<F> AddressSimplifier for F
where
    F: Fn(&str) -> String,
{
    fn simplify(&self, raw_path: &str) -> String {
        self(raw_path)
    }
}

/// Uses the path unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentitySimplifier;

impl AddressSimplifier for IdentitySimplifier {
    fn simplify(&self, raw_path: &str) -> String {
        raw_path.to_string()
    }
}

/// File name without directories or final extension
///
/// `Assets/Art/hero.png` becomes `hero`. Inputs with no usable file name
/// (empty, trailing separator only) fall back to the input itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStemSimplifier;

impl AddressSimplifier for FileStemSimplifier {
    fn simplify(&self, raw_path: &str) -> String {
        let name = raw_path
            .rsplit(['/', '\\'])
            .find(|segment| !segment.is_empty())
            .unwrap_or(raw_path);
        let stem = match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        };
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn file_stem_drops_directories_and_extension() {
        let s = FileStemSimplifier;
        assert_eq!(s.simplify("Assets/Art/hero.png"), "hero");
        assert_eq!(s.simplify("Assets\\Art\\hero.idle.png"), "hero.idle");
        assert_eq!(s.simplify("Assets/Art/"), "Art");
        assert_eq!(s.simplify(".gitkeep"), ".gitkeep");
        assert_eq!(s.simplify(""), "");
    }

    #[test]
    fn closures_are_simplifiers() {
        let upper = |raw: &str| raw.to_uppercase();
        assert_eq!(upper.simplify("a/b"), "A/B");
        assert_eq!(IdentitySimplifier.simplify("a/b"), "a/b");
    }

    proptest! {
        #[test]
        fn file_stem_is_total(raw in ".*") {
            let _ = FileStemSimplifier.simplify(&raw);
        }
    }
}
