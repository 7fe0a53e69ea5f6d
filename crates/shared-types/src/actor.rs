//! Who is acting on a document
//!
//! Callers describe the actor with a flat descriptor (the shape the web client
//! sends). Inside the engine it becomes an [`Identity`], and the rule for
//! picking "the" email out of the two contact hints lives in one place:
//! [`ContactHints`].

use crate::lenient::opt_string_or_number;
use serde::{Deserialize, Serialize};

/// Flat actor description as received from callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorDescriptor {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub is_guest: bool,
    #[serde(default)]
    pub guest_primary: Option<String>,
    #[serde(default)]
    pub guest_secondary: Option<String>,
}

/// Which contact hint wins when both might hold an email address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmailPrecedence {
    #[default]
    PrimaryFirst,
    SecondaryFirst,
}

/// The two loosely-typed contact strings a b2c actor carries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactHints {
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub secondary: Option<String>,
}

/// A contact string counts as an email when it contains `@`
pub fn looks_like_email(value: &str) -> bool {
    value.contains('@')
}

impl ContactHints {
    pub fn new(primary: Option<String>, secondary: Option<String>) -> Self {
        Self { primary, secondary }
    }

    /// `primary` when it looks like an email, otherwise `secondary` as-is
    pub fn primary_first(&self) -> Option<&str> {
        match self.primary.as_deref() {
            Some(p) if looks_like_email(p) => Some(p),
            _ => self.secondary.as_deref(),
        }
    }

    /// `secondary` when it looks like an email, otherwise `primary` as-is
    pub fn secondary_first(&self) -> Option<&str> {
        match self.secondary.as_deref() {
            Some(s) if looks_like_email(s) => Some(s),
            _ => self.primary.as_deref(),
        }
    }

    /// The single effective email under the given precedence rule
    pub fn effective_email(&self, precedence: EmailPrecedence) -> Option<&str> {
        match precedence {
            EmailPrecedence::PrimaryFirst => self.primary_first(),
            EmailPrecedence::SecondaryFirst => self.secondary_first(),
        }
    }

    /// Every hint that is present, primary first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.primary
            .as_deref()
            .into_iter()
            .chain(self.secondary.as_deref())
    }
}

/// The acting party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Identity {
    Authenticated {
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        contact: ContactHints,
    },
    Guest {
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        contact: ContactHints,
    },
}

impl Identity {
    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest { .. })
    }

    pub fn contact(&self) -> &ContactHints {
        match self {
            Identity::Authenticated { contact, .. } | Identity::Guest { contact, .. } => contact,
        }
    }

    /// The plain `email` field, whatever kind of actor this is
    pub fn email(&self) -> Option<&str> {
        match self {
            Identity::Authenticated { email, .. } | Identity::Guest { email, .. } => {
                email.as_deref()
            }
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Identity::Authenticated { id, .. } | Identity::Guest { id, .. } => id.as_deref(),
        }
    }
}

impl From<ActorDescriptor> for Identity {
    /// A guest without a primary hint falls back to its plain `email`.
    fn from(actor: ActorDescriptor) -> Self {
        if actor.is_guest {
            Identity::Guest {
                contact: ContactHints::new(
                    actor.guest_primary.or_else(|| actor.email.clone()),
                    actor.guest_secondary,
                ),
                email: actor.email,
                id: actor.id,
            }
        } else {
            Identity::Authenticated {
                email: actor.email,
                id: actor.id,
                contact: ContactHints::new(actor.guest_primary, actor.guest_secondary),
            }
        }
    }
}
