//! Event adapter: one capability set over every trigger kind.
//!
//! DESIGN
//! ======
//! The platform delivers three kinds of interaction: a command invocation, a
//! click on a control (button or select menu), and a form submission.
//! `Interaction` carries what all three share (id, actor, guild, permissions,
//! response token) and exposes kind-specific data through accessors that
//! return `Option`. The manager branches on kind exactly once, at dispatch.
//!
//! An operation a kind structurally cannot support is a programming error.
//! It is reported as `EventError::Unsupported` so the caller logs it loudly
//! and surfaces it instead of quietly doing nothing.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("{operation} is not supported for {kind} interactions")]
    Unsupported { operation: &'static str, kind: &'static str },
}

// =============================================================================
// PERMISSIONS
// =============================================================================

/// Permission bit set granted to the actor in the current guild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Permissions(u64);

impl Permissions {
    pub const KICK_MEMBERS: Self = Self(1 << 1);
    pub const BAN_MEMBERS: Self = Self(1 << 2);
    pub const ADMINISTRATOR: Self = Self(1 << 3);
    pub const MANAGE_GUILD: Self = Self(1 << 5);
    pub const MANAGE_MESSAGES: Self = Self(1 << 13);
    pub const MODERATE_MEMBERS: Self = Self(1 << 40);

    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Administrators implicitly hold every permission.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & Self::ADMINISTRATOR.0 != 0 || self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// The platform sends permission sets as decimal strings; accept plain
/// numbers too.
impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(bits) => Ok(Self(bits)),
            Raw::Text(text) => text
                .parse::<u64>()
                .map(Self)
                .map_err(|e| serde::de::Error::custom(format!("invalid permission bits {text:?}: {e}"))),
        }
    }
}

// =============================================================================
// INTERACTION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Button,
    Select,
}

/// The trigger-specific half of an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionKind {
    Command {
        name: String,
        #[serde(default)]
        options: HashMap<String, serde_json::Value>,
    },
    Component {
        custom_id: String,
        component: ComponentKind,
        #[serde(default)]
        values: Vec<String>,
    },
    ModalSubmit {
        custom_id: String,
        #[serde(default)]
        fields: HashMap<String, String>,
    },
}

impl InteractionKind {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::Component { component: ComponentKind::Button, .. } => "button",
            Self::Component { component: ComponentKind::Select, .. } => "select",
            Self::ModalSubmit { .. } => "modal_submit",
        }
    }
}

/// One inbound trigger from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    /// Token authorizing edits of this interaction's response.
    pub token: String,
    pub actor: Actor,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub permissions: Permissions,
    pub kind: InteractionKind,
}

impl Interaction {
    #[must_use]
    pub fn actor_id(&self) -> &str {
        &self.actor.id
    }

    #[must_use]
    pub fn guild_id(&self) -> Option<&str> {
        self.guild_id.as_deref()
    }

    #[must_use]
    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        self.kind.label()
    }

    /// Stable key identifying the conversation this interaction belongs to.
    #[must_use]
    pub fn session_key(&self) -> String {
        format!("{}:{}", self.guild_id().unwrap_or("dm"), self.actor.id)
    }

    /// Control or form identifier. Commands have none.
    #[must_use]
    pub fn custom_id(&self) -> Option<&str> {
        match &self.kind {
            InteractionKind::Component { custom_id, .. } | InteractionKind::ModalSubmit { custom_id, .. } => {
                Some(custom_id)
            }
            InteractionKind::Command { .. } => None,
        }
    }

    #[must_use]
    pub fn command_name(&self) -> Option<&str> {
        match &self.kind {
            InteractionKind::Command { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Options chosen in a select menu. Empty for every other kind.
    #[must_use]
    pub fn selected_values(&self) -> &[String] {
        match &self.kind {
            InteractionKind::Component { values, .. } => values,
            _ => &[],
        }
    }

    /// Value of a submitted form field.
    #[must_use]
    pub fn modal_field(&self, field_id: &str) -> Option<&str> {
        match &self.kind {
            InteractionKind::ModalSubmit { fields, .. } => fields.get(field_id).map(String::as_str),
            _ => None,
        }
    }

    /// Check that a form dialog can be opened in response to this interaction.
    ///
    /// # Errors
    ///
    /// Form submissions cannot be answered with another form.
    pub fn ensure_can_open_modal(&self) -> Result<(), EventError> {
        match self.kind {
            InteractionKind::ModalSubmit { .. } => {
                Err(EventError::Unsupported { operation: "opening a modal", kind: self.kind_label() })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.custom_id() {
            Some(custom_id) => write!(f, "{}({custom_id}) by {}", self.kind_label(), self.actor.id),
            None => write!(f, "{}({}) by {}", self.kind_label(), self.command_name().unwrap_or("-"), self.actor.id),
        }
    }
}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
