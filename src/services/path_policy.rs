//! Record path policy.
//!
//! Records created by an import live at an object path `Package.Name`,
//! where the package is a `/`-separated long name under a configured root:
//!
//! ```text
//! /Game/Items/Sword.Sword      package /Game/Items/Sword, name Sword
//! /Game/Items/Sword            same; the name is the last segment
//! ```

use crate::models::ObjectId;
use crate::{Error, Result};
use std::fmt;

/// Default root for created records.
pub const DEFAULT_ROOT: &str = "/Game";

/// Characters not allowed in a package name.
const INVALID_PACKAGE_CHARS: &[char] = &[
    '\\', ':', '*', '?', '"', '<', '>', '|', '\'', ' ', ',', '.', '&', '!', '~', '\n', '\r', '\t',
    '@', '#',
];

/// Characters not allowed in an object name.
const INVALID_NAME_CHARS: &[char] = &[
    '"', '\'', ' ', ',', '/', '.', ':', '|', '&', '!', '~', '\n', '\r', '\t', '@', '#', '(', ')',
    '{', '}', '[', ']', '=', ';', '^', '%', '$', '`',
];

/// A validated record location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordPath {
    package: String,
    name: String,
}

impl RecordPath {
    /// Long package name.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Object name inside the package.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Package.Name`.
    #[must_use]
    pub fn object_path(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }

    /// Object ID at this path.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        ObjectId::new(self.object_path())
    }
}

impl fmt::Display for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

/// Restricts where new records may be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPolicy {
    root: String,
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
        }
    }
}

impl PathPolicy {
    /// Creates a policy rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `root` is not a valid package name.
    pub fn new(root: impl Into<String>) -> Result<Self> {
        let root = root.into().trim().to_string();
        validate_package(&root)?;
        Ok(Self { root })
    }

    /// The namespace root.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Checks whether `package` lies strictly under the root.
    #[must_use]
    pub fn allows(&self, package: &str) -> bool {
        package
            .strip_prefix(self.root.as_str())
            .is_some_and(|rest| rest.len() > 1 && rest.starts_with('/'))
    }

    /// Splits and validates a user-supplied record path.
    ///
    /// Accepts `Package.Name` or a bare package, whose last segment becomes
    /// the name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the path is empty, malformed, or
    /// outside the root.
    pub fn split(&self, path: &str) -> Result<RecordPath> {
        let path = path.trim();
        if path.is_empty() {
            return Err(Error::InvalidInput("record path is empty".to_string()));
        }

        let (package, name) = match path.rsplit_once('.') {
            Some((package, name)) => (package, name),
            None => {
                let name = path.rsplit('/').next().unwrap_or_default();
                (path, name)
            },
        };

        validate_package(package)?;
        validate_name(name)?;
        if !self.allows(package) {
            return Err(Error::InvalidInput(format!(
                "record path '{path}' must be under '{}/'",
                self.root
            )));
        }

        Ok(RecordPath {
            package: package.to_string(),
            name: name.to_string(),
        })
    }
}

fn validate_package(package: &str) -> Result<()> {
    let reason = if !package.starts_with('/') {
        Some("must start with '/'")
    } else if package.len() > 1 && package.ends_with('/') {
        Some("must not end with '/'")
    } else if package.contains("//") {
        Some("must not contain '//'")
    } else if package.contains(INVALID_PACKAGE_CHARS) {
        Some("contains an invalid character")
    } else {
        None
    };
    reason.map_or(Ok(()), |reason| {
        Err(Error::InvalidInput(format!(
            "invalid package name '{package}': {reason}"
        )))
    })
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput("object name is empty".to_string()));
    }
    if name.contains(INVALID_NAME_CHARS) {
        return Err(Error::InvalidInput(format!(
            "invalid object name '{name}': contains an invalid character"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("/Game/Items/Sword.Sword", "/Game/Items/Sword", "Sword" ; "full object path")]
    #[test_case("  /Game/Items/Sword  ", "/Game/Items/Sword", "Sword" ; "bare package")]
    #[test_case("/Game/Items/Sword.Blade", "/Game/Items/Sword", "Blade" ; "name differs")]
    fn test_split_valid(input: &str, package: &str, name: &str) {
        let path = PathPolicy::default().split(input).unwrap();
        assert_eq!(path.package(), package);
        assert_eq!(path.name(), name);
    }

    #[test_case("" ; "empty")]
    #[test_case("Game/Items/Sword" ; "relative")]
    #[test_case("/Engine/Items/Sword" ; "outside root")]
    #[test_case("/Gameplay/Sword" ; "root prefix only")]
    #[test_case("/Game" ; "root itself")]
    #[test_case("/Game//Sword" ; "double slash")]
    #[test_case("/Game/Items/" ; "trailing slash")]
    #[test_case("/Game/My Items/Sword" ; "space in package")]
    #[test_case("/Game/Items/Sword.Bad Name" ; "space in name")]
    #[test_case("/Game/Items/Sword." ; "empty name")]
    fn test_split_invalid(input: &str) {
        assert!(matches!(
            PathPolicy::default().split(input),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_custom_root() {
        let policy = PathPolicy::new("/Game/Data").unwrap();
        assert!(policy.split("/Game/Data/Npc/Bob").is_ok());
        assert!(policy.split("/Game/Items/Sword").is_err());
        assert!(PathPolicy::new("Game").is_err());
    }

    #[test]
    fn test_object_path() {
        let path = PathPolicy::default().split("/Game/Items/Sword").unwrap();
        assert_eq!(path.object_path(), "/Game/Items/Sword.Sword");
        assert_eq!(path.object_id(), ObjectId::new("/Game/Items/Sword.Sword"));
        assert_eq!(path.to_string(), "/Game/Items/Sword.Sword");
    }
}
