//! GitHub endpoint locations.

/// GitHub OAuth authorization URL.
const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

/// GitHub OAuth token URL.
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// GitHub REST API base URL.
const GITHUB_API_BASE: &str = "https://api.github.com";

/// Where the OAuth and REST endpoints live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubEndpoints {
    /// OAuth authorization page.
    pub authorize_url: String,
    /// OAuth token exchange endpoint.
    pub token_url: String,
    /// REST API base, without a trailing slash.
    pub api_base: String,
}

impl GithubEndpoints {
    /// Points every endpoint at one host, as GitHub Enterprise Server or a
    /// local fake would expose them.
    #[must_use]
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorize_url: format!("{base}/login/oauth/authorize"),
            token_url: format!("{base}/login/oauth/access_token"),
            api_base: base.to_string(),
        }
    }

    /// Overrides only the REST API base.
    #[must_use]
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }
}

impl Default for GithubEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: GITHUB_AUTHORIZE_URL.to_string(),
            token_url: GITHUB_TOKEN_URL.to_string(),
            api_base: GITHUB_API_BASE.to_string(),
        }
    }
}
