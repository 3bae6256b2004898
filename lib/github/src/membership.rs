//! Organization-membership checks against the GitHub REST API.

use std::time::Duration;

use async_trait::async_trait;
use orgwarden_access::{MembershipOracle, MembershipQuery, MembershipVerdict, OracleError};
use reqwest::{StatusCode, Url, header};
use rootcause::prelude::Report;
use tracing::{debug, instrument};

use crate::{GITHUB_ACCEPT, http_client};

/// Asks GitHub whether a user belongs to an organization.
///
/// `204` means member. `404` means not a member; `302` means the token's owner
/// cannot see the member list, which GitHub uses for non-members too. Anything
/// else is an [`OracleError`].
#[derive(Debug, Clone)]
pub struct GithubMembershipClient {
    http: reqwest::Client,
    api_base: Url,
}

impl GithubMembershipClient {
    /// Creates a client for the REST API at `api_base`, bounding each request by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_base` is not a valid base URL or the HTTP
    /// client cannot be built.
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, Report<OracleError>> {
        let api_base = Url::parse(api_base).map_err(|e| OracleError::RequestFailed {
            details: format!("invalid API base URL: {e}"),
        })?;
        if api_base.cannot_be_a_base() {
            return Err(OracleError::RequestFailed {
                details: format!("API base URL cannot be a base: {api_base}"),
            }
            .into());
        }

        let http = http_client(Some(timeout)).map_err(|e| OracleError::RequestFailed {
            details: format!("failed to create HTTP client: {e}"),
        })?;

        Ok(Self { http, api_base })
    }

    fn membership_url(&self, organization: &str, username: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["orgs", organization, "members", username]);
        }
        url
    }
}

#[async_trait]
impl MembershipOracle for GithubMembershipClient {
    #[instrument(skip_all, fields(username = %query.username, organization = %query.organization))]
    async fn check_membership(
        &self,
        query: &MembershipQuery<'_>,
    ) -> Result<MembershipVerdict, Report<OracleError>> {
        let url = self.membership_url(query.organization, query.username);

        let response = self
            .http
            .get(url)
            .bearer_auth(query.access_token)
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout
                } else {
                    OracleError::RequestFailed {
                        details: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        debug!(status = status.as_u16(), "membership response");

        match status {
            StatusCode::NO_CONTENT => Ok(MembershipVerdict::Member),
            StatusCode::NOT_FOUND | StatusCode::FOUND => Ok(MembershipVerdict::NotMember),
            other => Err(OracleError::UnexpectedStatus {
                status: other.as_u16(),
            }
            .into()),
        }
    }
}
