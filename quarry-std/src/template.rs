//! # Template Locations
//!
//! A marker names its template either by a bare id (`activeUsers`) or by a
//! full id (`users.active`). Bare ids live in the namespace of the interface
//! that declares the method, so the declaring type decides where the template
//! file is looked up:
//!
//! | marker id | declaring type | namespace | path |
//! |-----------|----------------|-----------|------|
//! | `activeUsers` | `app::repo::UserRepository` | `app::repo::UserRepository` | `templates/app/repo/UserRepository.xml` |
//! | `users.active` | any | `users` | `templates/users.xml` |

use quarry_core::{TemplateLocation, TypeRef};

/// Where template files are looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSettings {
    root: String,
    extension: String,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self::new("templates", "xml")
    }
}

impl TemplateSettings {
    /// Templates under `root`, stored in files ending in `.extension`.
    pub fn new(root: impl Into<String>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            root: root.into().trim_end_matches('/').to_string(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// The template root directory.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The template file extension, without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Resolve a marker template id against the declaring type.
    ///
    /// Returns `None` for blank ids and for ids with an empty dotted segment.
    pub fn resolve(&self, id: &str, declaring_type: TypeRef) -> Option<TemplateLocation> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }

        match id.rsplit_once('.') {
            Some((namespace, local))
                if !local.is_empty() && !namespace.split('.').any(str::is_empty) =>
            {
                let path = self.path_of(&[&namespace.replace('.', "/")]);
                Some(TemplateLocation {
                    namespace: namespace.to_string(),
                    id: local.to_string(),
                    path,
                })
            }
            Some(_) => None,
            None => {
                let path = self.path_of(&[&declaring_type.template_dir(), declaring_type.name()]);
                Some(TemplateLocation {
                    namespace: declaring_type.qualified_name(),
                    id: id.to_string(),
                    path,
                })
            }
        }
    }

    fn path_of(&self, segments: &[&str]) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(segments.len() + 1);
        if !self.root.is_empty() {
            parts.push(&self.root);
        }
        parts.extend(segments.iter().copied().filter(|s| !s.is_empty()));
        let stem = parts.join("/");
        if self.extension.is_empty() {
            stem
        } else {
            format!("{}.{}", stem, self.extension)
        }
    }
}
