//! The persisted account record.

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, Duration};

/// One account in the registry, keyed externally by username.
///
/// Field types mirror the registry file: counters and limits are `i64` so a
/// hand-edited file with out-of-range values still loads (`<= 0` reads as
/// "unlimited" / "never"), and all arithmetic saturates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Shared-secret credential, compared by exact string match.
    pub password: String,

    /// Byte ceiling on `upload_bytes + download_bytes` (`<= 0` = unlimited).
    #[serde(default)]
    pub max_download_bytes: i64,

    /// Days until expiration, anchored at `account_creation_date`
    /// (`<= 0` = never expires).
    #[serde(default)]
    pub expiration_days: i64,

    /// Creation date as `YYYY-MM-DD`. Absent or unparseable means the
    /// account never expires by date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_creation_date: Option<String>,

    /// Administrative kill-switch; overrides every other check.
    #[serde(default)]
    pub blocked: bool,

    /// Exempt from the concurrent-IP policy enforced elsewhere. Preserved
    /// and surfaced, never evaluated by this engine.
    #[serde(default)]
    pub unlimited_user: bool,

    /// Accounted upload bytes.
    #[serde(default)]
    pub upload_bytes: i64,

    /// Accounted download bytes.
    #[serde(default)]
    pub download_bytes: i64,

    /// Fields this core does not understand but must round-trip, so
    /// collaborator tooling can extend records (e.g. `status`, `token`).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Account {
    /// Create a minimal account with the given password and no limits.
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            max_download_bytes: 0,
            expiration_days: 0,
            account_creation_date: None,
            blocked: false,
            unlimited_user: false,
            upload_bytes: 0,
            download_bytes: 0,
            extra: serde_json::Map::new(),
        }
    }

    /// Parse `account_creation_date`, `None` if absent or malformed.
    pub fn creation_date(&self) -> Option<Date> {
        let raw = self.account_creation_date.as_deref()?;
        let format = format_description!("[year]-[month]-[day]");
        Date::parse(raw, &format).ok()
    }

    /// The first calendar day on which the account counts as expired,
    /// `None` if it never expires by date.
    pub fn expires_on(&self) -> Option<Date> {
        if self.expiration_days <= 0 {
            return None;
        }
        self.creation_date()?
            .checked_add(Duration::days(self.expiration_days))
    }

    /// Combined accounted traffic, saturating.
    #[inline]
    pub fn total_bytes(&self) -> i64 {
        self.upload_bytes.saturating_add(self.download_bytes)
    }

    /// Whether combined traffic has reached the quota (boundary inclusive).
    #[inline]
    pub fn over_quota(&self) -> bool {
        self.max_download_bytes > 0 && self.total_bytes() >= self.max_download_bytes
    }
}

/// Format a date the way the registry file stores it (`YYYY-MM-DD`).
pub(crate) fn format_date(date: Date) -> String {
    let format = format_description!("[year]-[month]-[day]");
    // The format description has no fallible components.
    date.format(&format).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn creation_date_parses() {
        let mut account = Account::with_password("p");
        account.account_creation_date = Some("2024-02-29".to_string());
        assert_eq!(account.creation_date(), Some(date!(2024 - 02 - 29)));
    }

    #[test]
    fn creation_date_malformed_is_none() {
        let mut account = Account::with_password("p");
        account.account_creation_date = Some("02/29/2024".to_string());
        assert_eq!(account.creation_date(), None);
        assert_eq!(account.expires_on(), None);
    }

    #[test]
    fn expires_on_adds_days() {
        let mut account = Account::with_password("p");
        account.account_creation_date = Some("2026-01-01".to_string());
        account.expiration_days = 31;
        assert_eq!(account.expires_on(), Some(date!(2026 - 02 - 01)));
    }

    #[test]
    fn no_expiry_when_days_zero_or_negative() {
        let mut account = Account::with_password("p");
        account.account_creation_date = Some("2000-01-01".to_string());
        account.expiration_days = 0;
        assert_eq!(account.expires_on(), None);
        account.expiration_days = -7;
        assert_eq!(account.expires_on(), None);
    }

    #[test]
    fn total_bytes_saturates() {
        let mut account = Account::with_password("p");
        account.upload_bytes = i64::MAX;
        account.download_bytes = 1;
        assert_eq!(account.total_bytes(), i64::MAX);
    }

    #[test]
    fn unknown_fields_round_trip() {
        let raw = r#"{
            "password": "p1",
            "max_download_bytes": 1000,
            "expiration_days": 30,
            "account_creation_date": "2026-01-15",
            "blocked": false,
            "unlimited_user": true,
            "upload_bytes": 0,
            "download_bytes": 0,
            "status": "trial",
            "token": "abc123"
        }"#;
        let account: Account = serde_json::from_str(raw).unwrap();
        assert_eq!(account.extra.get("status").unwrap(), "trial");

        let back = serde_json::to_value(&account).unwrap();
        assert_eq!(back["token"], "abc123");
        assert_eq!(back["password"], "p1");
        // Zero counters stay explicit in the serialized form.
        assert_eq!(back["upload_bytes"], 0);
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let account: Account = serde_json::from_str(r#"{"password": "x"}"#).unwrap();
        assert_eq!(account.max_download_bytes, 0);
        assert_eq!(account.expiration_days, 0);
        assert!(account.account_creation_date.is_none());
        assert!(!account.blocked);
        assert_eq!(account.upload_bytes, 0);
    }
}
