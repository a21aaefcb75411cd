use serde::{Deserialize, Serialize};

/// Prompt sent to the language model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Instructions, layer listing, operation schema and response grammar
    pub system: String,

    /// The user's request, verbatim
    pub user: String,
}

impl Prompt {
    /// Single-string rendering for display and for backends without roles
    pub fn render(&self) -> String {
        format!("{}\n\nUser request:\n{}", self.system, self.user)
    }

    pub fn len(&self) -> usize {
        self.system.len() + self.user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.system.is_empty() && self.user.is_empty()
    }
}
