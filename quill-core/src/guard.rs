//! Safe mode and role-based checks run before a statement reaches the
//! connection.

use crate::{Error, Result};
use std::collections::{HashMap, HashSet};

/// Action tag required for raw statements mentioning `drop`
pub const ACTION_DROP: &str = "drop";
/// Action tag required for raw statements mentioning `delete`
pub const ACTION_DELETE: &str = "delete";

#[derive(Debug, Clone)]
pub struct Guard {
    safe_mode: bool,
    roles: HashMap<String, HashSet<String>>,
    current_role: Option<String>,
}

impl Default for Guard {
    fn default() -> Self {
        Self {
            safe_mode: true,
            roles: HashMap::new(),
            current_role: None,
        }
    }
}

impl Guard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn safe_mode(&self) -> bool {
        self.safe_mode
    }

    pub fn set_safe_mode(&mut self, enabled: bool) {
        self.safe_mode = enabled;
    }

    /// Register (or replace) the set of actions a role may perform
    pub fn define_role<I, A>(&mut self, role: impl Into<String>, actions: I)
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let actions = actions.into_iter().map(Into::into).collect();
        self.roles.insert(role.into(), actions);
    }

    pub fn set_role(&mut self, role: impl Into<String>) {
        self.current_role = Some(role.into());
    }

    pub fn clear_role(&mut self) {
        self.current_role = None;
    }

    pub fn current_role(&self) -> Option<&str> {
        self.current_role.as_deref()
    }

    /// Refuse an unconditional delete while safe mode is on
    pub fn check_delete(&self, has_predicates: bool) -> Result<()> {
        if self.safe_mode && !has_predicates {
            tracing::warn!(target: "quill::guard", "safe mode blocked DELETE without WHERE");
            return Err(Error::blocked("Safe Mode: DELETE without WHERE blocked."));
        }
        Ok(())
    }

    /// Without a current role everything is allowed. A current role that
    /// was never defined allows nothing.
    pub fn check_permission(&self, action: &str) -> Result<()> {
        let Some(role) = self.current_role.as_deref() else {
            return Ok(());
        };

        let permitted = self
            .roles
            .get(role)
            .is_some_and(|actions| actions.contains(action));
        if !permitted {
            tracing::warn!(target: "quill::guard", role, action, "permission denied");
            return Err(Error::permission_denied(role, action));
        }
        Ok(())
    }

    /// Scan raw SQL for destructive keywords and check the matching
    /// permissions.
    ///
    /// This is a case-insensitive substring search over the text, not a
    /// parse: `SELECT dropped_flag FROM t` needs the `drop` permission too.
    pub fn check_raw(&self, sql: &str) -> Result<()> {
        let lowered = sql.to_ascii_lowercase();
        if lowered.contains(ACTION_DROP) {
            self.check_permission(ACTION_DROP)?;
        }
        if lowered.contains(ACTION_DELETE) {
            self.check_permission(ACTION_DELETE)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_mode_blocks_unconditional_delete() {
        let guard = Guard::new();
        assert!(guard.safe_mode());
        assert!(matches!(guard.check_delete(false), Err(Error::BlockedOperation { .. })));
        assert!(guard.check_delete(true).is_ok());
    }

    #[test]
    fn test_safe_mode_off_allows_unconditional_delete() {
        let mut guard = Guard::new();
        guard.set_safe_mode(false);
        assert!(guard.check_delete(false).is_ok());
    }

    #[test]
    fn test_no_role_permits_everything() {
        let guard = Guard::new();
        assert!(guard.check_raw("DROP TABLE x").is_ok());
        assert!(guard.check_raw("delete from x").is_ok());
    }

    #[test]
    fn test_role_without_drop_is_denied() {
        let mut guard = Guard::new();
        guard.define_role("editor", ["delete"]);
        guard.set_role("editor");

        let err = guard.check_raw("DROP TABLE x").unwrap_err();
        assert!(matches!(
            err,
            Error::PermissionDenied { ref role, ref action } if role == "editor" && action == "drop"
        ));
        assert!(guard.check_raw("DELETE FROM x WHERE id = 1").is_ok());
    }

    #[test]
    fn test_scan_is_textual() {
        let mut guard = Guard::new();
        guard.define_role("reader", Vec::<String>::new());
        guard.set_role("reader");
        assert!(guard.check_raw("SELECT dropped_flag FROM t").is_err());
        assert!(guard.check_raw("SELECT id FROM t").is_ok());
    }

    #[test]
    fn test_undefined_role_permits_nothing() {
        let mut guard = Guard::new();
        guard.set_role("ghost");
        assert!(guard.check_permission("drop").is_err());
        guard.clear_role();
        assert!(guard.check_permission("drop").is_ok());
    }
}
