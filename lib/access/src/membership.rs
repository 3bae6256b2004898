//! The membership oracle seam.

use std::time::Duration;

use async_trait::async_trait;
use rootcause::prelude::Report;

use crate::error::OracleError;

/// A single "is this user in that organization?" question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipQuery<'a> {
    /// Login handle to look up.
    pub username: &'a str,
    /// Organization to check against.
    pub organization: &'a str,
    /// Token the query is made with.
    pub access_token: &'a str,
}

/// The oracle's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipVerdict {
    /// The user belongs to the organization.
    Member,
    /// The user does not belong to the organization, or the token cannot see it.
    NotMember,
}

impl MembershipVerdict {
    /// Returns true for [`MembershipVerdict::Member`].
    #[must_use]
    pub fn is_member(self) -> bool {
        matches!(self, Self::Member)
    }
}

/// External service answering organization-membership questions.
///
/// Implementations hold no per-user state; every call is an independent,
/// read-only query.
#[async_trait]
pub trait MembershipOracle: Send + Sync {
    /// Asks whether `query.username` is a member of `query.organization`.
    ///
    /// # Errors
    ///
    /// Returns an error if the oracle could not give a yes/no answer.
    async fn check_membership(
        &self,
        query: &MembershipQuery<'_>,
    ) -> Result<MembershipVerdict, Report<OracleError>>;
}

/// Runs one oracle query bounded by `timeout`.
///
/// An elapsed timeout is reported as [`OracleError::Timeout`], so callers can
/// treat it like any other oracle failure.
pub(crate) async fn check_with_timeout(
    oracle: &dyn MembershipOracle,
    query: &MembershipQuery<'_>,
    timeout: Duration,
) -> Result<MembershipVerdict, Report<OracleError>> {
    match tokio::time::timeout(timeout, oracle.check_membership(query)).await {
        Ok(result) => result,
        Err(_) => Err(OracleError::Timeout.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowOracle;

    #[async_trait]
    impl MembershipOracle for SlowOracle {
        async fn check_membership(
            &self,
            _query: &MembershipQuery<'_>,
        ) -> Result<MembershipVerdict, Report<OracleError>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(MembershipVerdict::Member)
        }
    }

    struct InstantOracle(MembershipVerdict);

    #[async_trait]
    impl MembershipOracle for InstantOracle {
        async fn check_membership(
            &self,
            _query: &MembershipQuery<'_>,
        ) -> Result<MembershipVerdict, Report<OracleError>> {
            Ok(self.0)
        }
    }

    fn query() -> MembershipQuery<'static> {
        MembershipQuery {
            username: "octocat",
            organization: "acme",
            access_token: "gho_token",
        }
    }

    #[test]
    fn verdict_is_member() {
        assert!(MembershipVerdict::Member.is_member());
        assert!(!MembershipVerdict::NotMember.is_member());
    }

    #[tokio::test]
    async fn answer_within_timeout_passes_through() {
        let verdict = check_with_timeout(
            &InstantOracle(MembershipVerdict::NotMember),
            &query(),
            Duration::from_secs(1),
        )
        .await
        .expect("oracle answered");
        assert_eq!(verdict, MembershipVerdict::NotMember);
    }

    #[tokio::test]
    async fn slow_oracle_times_out() {
        let err = check_with_timeout(&SlowOracle, &query(), Duration::from_millis(20))
            .await
            .expect_err("should time out");
        assert!(err.to_string().contains("timed out"));
    }
}
