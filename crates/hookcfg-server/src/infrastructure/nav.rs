//! Navigation URLs inside the host application.

use crate::application::ports::NavBuilder;

/// Builds URLs relative to the host's context path.
#[derive(Debug, Clone, Default)]
pub struct ContextPathNav {
    context_path: String,
}

impl ContextPathNav {
    /// `context_path` is the prefix the host is mounted under, e.g.
    /// `/bitbucket`.  A trailing slash is ignored.
    pub fn new(context_path: &str) -> Self {
        Self {
            context_path: context_path.trim_end_matches('/').to_string(),
        }
    }

    /// Prefixes `path` (which must start with `/`) with the context path.
    pub fn relative(&self, path: &str) -> String {
        format!("{}{}", self.context_path, path)
    }
}

impl NavBuilder for ContextPathNav {
    fn addons(&self) -> String {
        self.relative("/plugins/servlet/upm")
    }
}
