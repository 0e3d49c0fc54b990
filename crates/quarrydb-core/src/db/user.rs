use std::fmt;

///
/// User
///
/// Identity that namespaces index progress and entries. Index definitions
/// are shared between users.
///

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct User {
    uid: Option<String>,
}

impl User {
    pub const UNAUTHENTICATED: Self = Self { uid: None };

    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
        }
    }

    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.uid.is_some()
    }

    /// Row namespace; unauthenticated users share the empty uid.
    #[must_use]
    pub fn storage_uid(&self) -> &str {
        self.uid.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uid.as_deref().unwrap_or("<unauthenticated>"))
    }
}
