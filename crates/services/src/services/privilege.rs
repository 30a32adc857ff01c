//! Gate deciding which write/export actions the current user may use.

use std::collections::HashSet;

pub trait PrivilegeCheck: Send + Sync {
    fn is_granted(&self, privilege: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PrivilegeCheck for AllowAll {
    fn is_granted(&self, _privilege: &str) -> bool {
        true
    }
}

/// Fixed set of granted privilege names.
#[derive(Debug, Clone, Default)]
pub struct StaticPrivileges {
    granted: HashSet<String>,
}

impl StaticPrivileges {
    /// Parse a comma-separated list such as `category:create,category:delete`.
    pub fn from_csv(raw: &str) -> Self {
        raw.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect()
    }
}

impl FromIterator<String> for StaticPrivileges {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            granted: iter.into_iter().collect(),
        }
    }
}

impl PrivilegeCheck for StaticPrivileges {
    fn is_granted(&self, privilege: &str) -> bool {
        self.granted.contains(privilege)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_privileges_from_csv() {
        let privileges = StaticPrivileges::from_csv(" category:create, ,season:delete");
        assert!(privileges.is_granted("category:create"));
        assert!(privileges.is_granted("season:delete"));
        assert!(!privileges.is_granted("category:delete"));
        assert!(AllowAll.is_granted("anything"));
    }
}
