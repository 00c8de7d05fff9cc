//! Trusted-header authentication gate.
//!
//! The settings server is meant to run behind the host's reverse proxy,
//! which authenticates the browser session and forwards the user key in a
//! request header (`X-Remote-User` by default).  Permission comes from the
//! administrator lists in [`ServerConfig`].

use std::collections::HashSet;

use hookcfg_core::UserIdentity;

use crate::application::ports::AuthGate;
use crate::domain::config::ServerConfig;
use crate::domain::request::RequestContext;

/// [`AuthGate`] that reads the user from a header and checks static lists.
#[derive(Debug, Clone)]
pub struct HeaderAuthGate {
    header: String,
    administrators: HashSet<String>,
    system_administrators: HashSet<String>,
}

impl HeaderAuthGate {
    pub fn new(
        header: impl Into<String>,
        administrators: impl IntoIterator<Item = String>,
        system_administrators: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            header: header.into(),
            administrators: administrators.into_iter().collect(),
            system_administrators: system_administrators.into_iter().collect(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.user_header.clone(),
            config.administrators.iter().cloned(),
            config.system_administrators.iter().cloned(),
        )
    }
}

impl AuthGate for HeaderAuthGate {
    fn current_user(&self, request: &RequestContext) -> Option<UserIdentity> {
        request
            .header(&self.header)
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(UserIdentity::new)
    }

    fn is_administrator(&self, user: &UserIdentity) -> bool {
        self.administrators.contains(&user.key) || self.system_administrators.contains(&user.key)
    }
}
