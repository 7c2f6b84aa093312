//! Per-rule policy resolution
//!
//! Merge mode and backup strategy are resolved per rule in a fixed order,
//! with earlier sources winning:
//! 1. Call-site override (CLI `--mode` / `--backup`)
//! 2. The rule's own `merge` / `backup` value
//! 3. The built-in default
//!
//! Blank values at any level fall through to the next one.

use std::str::FromStr;

use tplsync_fs::BackupStrategy;

use super::sync_config::FileRule;
use crate::Result;
use crate::merge::MergeMode;

/// Merge mode used when neither the override nor the rule names one
pub const DEFAULT_MERGE: MergeMode = MergeMode::ThreeWay;

/// Backup strategy used when neither the override nor the rule names one
pub const DEFAULT_BACKUP: BackupStrategy = BackupStrategy::Timestamp;

/// Pick the first non-blank value, in precedence order.
pub fn resolve_setting<'a>(
    override_value: Option<&'a str>,
    rule_value: Option<&'a str>,
) -> Option<&'a str> {
    [override_value, rule_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// Effective merge and backup behavior for one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulePolicy {
    pub merge: MergeMode,
    pub backup: BackupStrategy,
}

impl Default for RulePolicy {
    fn default() -> Self {
        Self {
            merge: DEFAULT_MERGE,
            backup: DEFAULT_BACKUP,
        }
    }
}

impl RulePolicy {
    /// Resolve the policy for `rule`, applying the optional overrides first.
    ///
    /// Unknown values fail with [`crate::Error::UnsupportedMode`] or the
    /// filesystem layer's unknown-backup error.
    pub fn resolve(
        rule: &FileRule,
        mode_override: Option<&str>,
        backup_override: Option<&str>,
    ) -> Result<Self> {
        let merge = match resolve_setting(mode_override, rule.merge.as_deref()) {
            Some(value) => MergeMode::from_str(value)?,
            None => DEFAULT_MERGE,
        };
        let backup = match resolve_setting(backup_override, rule.backup.as_deref()) {
            Some(value) => BackupStrategy::from_str(value)?,
            None => DEFAULT_BACKUP,
        };

        Ok(Self { merge, backup })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_setting_precedence() {
        assert_eq!(resolve_setting(Some("overwrite"), Some("keep_local")), Some("overwrite"));
        assert_eq!(resolve_setting(Some("  "), Some("keep_local")), Some("keep_local"));
        assert_eq!(resolve_setting(None, Some("")), None);
        assert_eq!(resolve_setting(None, None), None);
    }

    #[test]
    fn test_policy_defaults() {
        let rule = FileRule::new("tpl", "a.txt");
        let policy = RulePolicy::resolve(&rule, None, None).unwrap();
        assert_eq!(policy, RulePolicy::default());
        assert_eq!(policy.merge, MergeMode::ThreeWay);
        assert_eq!(policy.backup, BackupStrategy::Timestamp);
    }

    #[test]
    fn test_policy_rule_values_used() {
        let rule = FileRule::new("tpl", "a.txt")
            .with_merge("keep_local")
            .with_backup("none");
        let policy = RulePolicy::resolve(&rule, None, None).unwrap();
        assert_eq!(policy.merge, MergeMode::KeepLocal);
        assert_eq!(policy.backup, BackupStrategy::None);
    }

    #[test]
    fn test_policy_override_wins() {
        let rule = FileRule::new("tpl", "a.txt").with_merge("keep_local");
        let policy = RulePolicy::resolve(&rule, Some("overwrite"), Some("none")).unwrap();
        assert_eq!(policy.merge, MergeMode::Overwrite);
        assert_eq!(policy.backup, BackupStrategy::None);
    }

    #[test]
    fn test_policy_unknown_values_rejected() {
        let rule = FileRule::new("tpl", "a.txt").with_merge("squash");
        assert!(matches!(
            RulePolicy::resolve(&rule, None, None),
            Err(crate::Error::UnsupportedMode { .. })
        ));

        let rule = FileRule::new("tpl", "a.txt").with_backup("daily");
        assert!(RulePolicy::resolve(&rule, None, None).is_err());
    }
}
