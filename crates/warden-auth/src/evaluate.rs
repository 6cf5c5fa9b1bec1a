//! The eligibility evaluator.

use time::Date;

use crate::account::Account;
use crate::decision::Decision;

/// Evaluate one connection attempt against an account record.
///
/// Pure function of its inputs: `account` is the cached record (or `None`
/// when the username is unknown), `password` the submitted credential, and
/// `today` the current UTC calendar date.
///
/// The checks short-circuit in a fixed order — absent, blocked, credential,
/// expiration, quota — and the first failing check decides the outcome.
/// Blocked is checked before the credential, so a blocked account reports
/// "blocked" even when the password is also wrong. Both the expiration and
/// quota boundaries are inclusive.
pub fn evaluate(account: Option<&Account>, password: &str, today: Date) -> Decision {
    let Some(account) = account else {
        return Decision::UserNotFound;
    };

    if account.blocked {
        return Decision::Blocked;
    }

    if account.password != password {
        return Decision::InvalidCredential;
    }

    if let Some(expires_on) = account.expires_on()
        && today >= expires_on
    {
        return Decision::Expired;
    }

    if account.over_quota() {
        return Decision::QuotaExceeded;
    }

    Decision::Allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    const TODAY: Date = date!(2026 - 08 - 04);

    fn account() -> Account {
        Account::with_password("p1")
    }

    #[test]
    fn absent_account_is_not_found() {
        assert_eq!(evaluate(None, "anything", TODAY), Decision::UserNotFound);
    }

    #[test]
    fn allowed_with_no_limits() {
        let a = account();
        assert_eq!(evaluate(Some(&a), "p1", TODAY), Decision::Allowed);
    }

    #[test]
    fn wrong_password_rejected() {
        let a = account();
        assert_eq!(
            evaluate(Some(&a), "wrong", TODAY),
            Decision::InvalidCredential
        );
    }

    #[test]
    fn blocked_wins_over_everything() {
        let mut a = account();
        a.blocked = true;
        // Even with a wrong password the outcome is Blocked.
        assert_eq!(evaluate(Some(&a), "wrong", TODAY), Decision::Blocked);
        assert_eq!(evaluate(Some(&a), "p1", TODAY), Decision::Blocked);

        // And regardless of any other failing field.
        a.max_download_bytes = 1;
        a.upload_bytes = 10;
        assert_eq!(evaluate(Some(&a), "p1", TODAY), Decision::Blocked);
    }

    #[test]
    fn credential_checked_before_expiration_and_quota() {
        let mut a = account();
        a.account_creation_date = Some("2000-01-01".to_string());
        a.expiration_days = 1;
        a.max_download_bytes = 1;
        a.upload_bytes = 10;
        assert_eq!(
            evaluate(Some(&a), "wrong", TODAY),
            Decision::InvalidCredential
        );
    }

    #[test]
    fn zero_expiration_days_never_expires() {
        let mut a = account();
        a.account_creation_date = Some("1970-01-01".to_string());
        a.expiration_days = 0;
        assert_eq!(evaluate(Some(&a), "p1", TODAY), Decision::Allowed);
    }

    #[test]
    fn missing_creation_date_never_expires() {
        let mut a = account();
        a.expiration_days = 30;
        assert_eq!(evaluate(Some(&a), "p1", TODAY), Decision::Allowed);
    }

    #[test]
    fn expiration_boundary_is_inclusive() {
        let mut a = account();
        a.account_creation_date = Some("2026-07-05".to_string());
        a.expiration_days = 30;
        // 2026-07-05 + 30 days = 2026-08-04 = TODAY: expired.
        assert_eq!(evaluate(Some(&a), "p1", TODAY), Decision::Expired);
        // One day earlier it is still allowed.
        assert_eq!(
            evaluate(Some(&a), "p1", date!(2026 - 08 - 03)),
            Decision::Allowed
        );
    }

    #[test]
    fn quota_boundary_is_inclusive() {
        let mut a = account();
        a.max_download_bytes = 1000;
        a.upload_bytes = 600;
        a.download_bytes = 400;
        assert_eq!(evaluate(Some(&a), "p1", TODAY), Decision::QuotaExceeded);

        a.download_bytes = 399;
        assert_eq!(evaluate(Some(&a), "p1", TODAY), Decision::Allowed);
    }

    #[test]
    fn zero_quota_is_unlimited() {
        let mut a = account();
        a.max_download_bytes = 0;
        a.upload_bytes = i64::MAX / 2;
        a.download_bytes = i64::MAX / 2;
        assert_eq!(evaluate(Some(&a), "p1", TODAY), Decision::Allowed);
    }

    #[test]
    fn unlimited_user_flag_does_not_bypass_quota() {
        let mut a = account();
        a.unlimited_user = true;
        a.max_download_bytes = 100;
        a.download_bytes = 100;
        assert_eq!(evaluate(Some(&a), "p1", TODAY), Decision::QuotaExceeded);
    }

    #[test]
    fn evaluation_is_pure() {
        let mut a = account();
        a.max_download_bytes = 1000;
        a.upload_bytes = 999;
        for _ in 0..100 {
            assert_eq!(evaluate(Some(&a), "p1", TODAY), Decision::Allowed);
        }
    }
}
