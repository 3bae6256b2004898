//! GitHub adapters for orgwarden.
//!
//! - [`GithubOAuthClient`]: the OAuth code grant against github.com plus the
//!   `/user` profile lookup
//! - [`GithubMembershipClient`]: the organization-membership check
//!   (`GET /orgs/{org}/members/{username}`)
//!
//! Both talk to the endpoints in [`GithubEndpoints`], which default to the
//! public GitHub hosts and can be pointed elsewhere (GitHub Enterprise, tests).

mod endpoints;
mod membership;
mod oauth;

pub use endpoints::GithubEndpoints;
pub use membership::GithubMembershipClient;
pub use oauth::GithubOAuthClient;

/// User-Agent sent with every GitHub API request.
pub const USER_AGENT: &str = "github-securityprovider-connect";

/// Media type GitHub recommends for REST API requests.
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Builds an HTTP client that never follows redirects.
///
/// Redirects are disabled so a `302` from the membership endpoint stays
/// visible and OAuth responses cannot be bounced elsewhere.
fn http_client(timeout: Option<std::time::Duration>) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}
