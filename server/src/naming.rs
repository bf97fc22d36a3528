use std::sync::Arc;

use crate::random::{RandomSource, IDENTIFIER_LEN};

/// Longer extensions are dropped so storage names stay within file name limits.
const MAX_EXTENSION_LEN: usize = 64;

/// Produces opaque on-disk names for uploaded files.
///
/// Uniqueness is probabilistic, it rests on the entropy of the identifier.
/// Callers create storage files exclusively and ask for another name when
/// one is already taken.
#[derive(Clone)]
pub struct StorageNameGenerator {
    random: Arc<dyn RandomSource>,
}

impl StorageNameGenerator {
    #[must_use]
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Random identifier followed by the extension of `display_name`, if it has one.
    #[must_use]
    pub fn generate(&self, display_name: &str) -> String {
        let id = self.random.alphanumeric(IDENTIFIER_LEN);
        match extension(display_name) {
            Some(ext) => format!("{id}.{ext}"),
            None => id,
        }
    }
}

/// Text after the last `.` of the final path component.
fn extension(name: &str) -> Option<&str> {
    let file_name = match name.rfind(&['\\', '/']) {
        Some(ix) => &name[ix + 1..],
        None => name,
    };
    let (_, ext) = file_name.rsplit_once('.')?;
    let acceptable = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && !ext.chars().any(|c| c == ':' || c.is_control());
    acceptable.then_some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::OsRandom;
    use rstest::rstest;

    struct Fixed;

    impl RandomSource for Fixed {
        fn alphanumeric(&self, len: usize) -> String {
            "x".repeat(len)
        }
    }

    #[rstest]
    #[case("", None)]
    #[case("file", None)]
    #[case("file.", None)]
    #[case("file.txt", Some("txt"))]
    #[case("archive.tar.gz", Some("gz"))]
    #[case(".bashrc", Some("bashrc"))]
    #[case("dir.d/file", None)]
    #[case("dir\\file.ext", Some("ext"))]
    #[case("file.a:b", None)]
    #[trace]
    fn extension_tests(#[case] name: &str, #[case] expected: Option<&str>) {
        // Act
        let ext = extension(name);

        // Assert
        assert_eq!(ext, expected);
    }

    #[test]
    fn extension_too_long_dropped() {
        // Arrange
        let name = format!("file.{}", "e".repeat(MAX_EXTENSION_LEN + 1));

        // Act
        let ext = extension(&name);

        // Assert
        assert!(ext.is_none());
    }

    #[rstest]
    #[case("a.txt", format!("{}.txt", "x".repeat(IDENTIFIER_LEN)))]
    #[case("README", "x".repeat(IDENTIFIER_LEN))]
    #[trace]
    fn generate_appends_extension(#[case] display_name: &str, #[case] expected: String) {
        // Arrange
        let generator = StorageNameGenerator::new(Arc::new(Fixed));

        // Act
        let name = generator.generate(display_name);

        // Assert
        assert_eq!(name, expected);
    }

    #[test]
    fn generate_names_are_distinct() {
        // Arrange
        let generator = StorageNameGenerator::new(Arc::new(OsRandom));

        // Act
        let names: std::collections::HashSet<String> =
            (0..1000).map(|_| generator.generate("f.bin")).collect();

        // Assert
        assert_eq!(names.len(), 1000);
        assert!(names.iter().all(|n| n.len() == IDENTIFIER_LEN + 4));
    }
}
