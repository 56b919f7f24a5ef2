//! User token issuance.
//!
//! Endpoint: `GET token.get` (with an empty `usertoken`)
//!
//! Response body:
//! ```json
//! {
//!   "user_token": "2203269256ff7abcb649269df00e14c833dbf4ddfb5b36a1aae8b0",
//!   "app_config": { ... },
//!   "location": { "GEOIP_COUNTRY_CODE": "IT", ... }
//! }
//! ```
//!
//! When the caller is throttled the server still answers `200` but hands out
//! the placeholder `UpgradeOnlyUpgradeOnlyUpgradeOnly...`, which is useless.

use crate::auth::Session;
use crate::client::{ClientConfig, MusixmatchClient};
use crate::context::ApiContext;
use crate::error::Result;
use crate::transport::Params;
use crate::types::IssuedToken;
use tracing::{info, warn};

const THROTTLED_TOKEN_PREFIX: &str = "UpgradeOnly";

impl MusixmatchClient {
    /// Obtain a new user token for `context`.
    ///
    /// The request goes out with an empty credential (`usertoken=`).
    ///
    /// Returns `Ok(None)` if the server did not hand out a usable token
    /// (throttled, or an unexpected response). The caller is responsible for
    /// persisting the result.
    pub fn issue_token(context: ApiContext) -> Result<Option<IssuedToken>> {
        Self::issue_token_with(context, &ClientConfig::default())
    }

    pub fn issue_token_with(
        context: ApiContext,
        config: &ClientConfig,
    ) -> Result<Option<IssuedToken>> {
        Self::with_config(String::new(), context, config)?.request_token()
    }

    /// Call `token.get` through this client's transport.
    ///
    /// The client's own credential is replaced by an empty `usertoken`.
    pub fn request_token(&self) -> Result<Option<IssuedToken>> {
        let params = Params::new().set("usertoken", "");
        let Some(env) = self.call("token.get", &params)? else {
            return Ok(None);
        };

        let Some(user_token) = env
            .body_field::<String>("user_token")
            .filter(|t| !t.is_empty())
        else {
            warn!(status = env.status_code(), "token.get returned no user_token");
            return Ok(None);
        };
        if user_token.starts_with(THROTTLED_TOKEN_PREFIX) {
            warn!("token.get throttled, try again later");
            return Ok(None);
        }

        info!(context = %self.context(), "issued new user token");
        Ok(Some(IssuedToken {
            user_token,
            context: self.context(),
            app_config: env.body_field("app_config"),
            location: env.body_field("location"),
        }))
    }
}

impl IssuedToken {
    /// Create a client that authenticates with this token.
    pub fn client(&self) -> Result<MusixmatchClient> {
        MusixmatchClient::new(self.user_token.clone(), self.context)
    }

    /// Session record for [`Session::save`].
    pub fn to_session(&self) -> Session {
        Session {
            user_token: Some(self.user_token.clone()),
            context: self.context,
        }
    }
}
