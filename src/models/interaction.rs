use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;
use crate::models::{Millis, RecordId};

/// What kind of actor performed an interaction. Only profiles act today;
/// the original data model leaves room for e.g. editorial bots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Profile,
}

/// Target type of an interaction or comment parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Book,
    Note,
    Post,
    List,
    CurrentStatus,
    Profile,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Like,
    Save,
    Follow,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Profile => "profile",
        }
    }
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Book => "book",
            ObjectType::Note => "note",
            ObjectType::Post => "post",
            ObjectType::List => "list",
            ObjectType::CurrentStatus => "current_status",
            ObjectType::Profile => "profile",
            ObjectType::Comment => "comment",
        }
    }
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Like => "like",
            InteractionType::Save => "save",
            InteractionType::Follow => "follow",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(AgentType::Profile),
            other => Err(AppError::Validation(format!(
                "unknown agent type: {}",
                other
            ))),
        }
    }
}

impl FromStr for ObjectType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "book" => Ok(ObjectType::Book),
            "note" => Ok(ObjectType::Note),
            "post" => Ok(ObjectType::Post),
            "list" => Ok(ObjectType::List),
            "current_status" => Ok(ObjectType::CurrentStatus),
            "profile" => Ok(ObjectType::Profile),
            "comment" => Ok(ObjectType::Comment),
            other => Err(AppError::Validation(format!(
                "unknown object type: {}",
                other
            ))),
        }
    }
}

impl FromStr for InteractionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(InteractionType::Like),
            "save" => Ok(InteractionType::Save),
            "follow" => Ok(InteractionType::Follow),
            other => Err(AppError::Validation(format!(
                "unknown interaction type: {}",
                other
            ))),
        }
    }
}

/// One agent acting on one object: a like, save, or follow edge.
///
/// At most one active interaction may exist per
/// (agent, agent_type, object, object_type, interaction_type) tuple; the
/// store enforces this with a uniqueness constraint rather than
/// query-before-insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: RecordId,
    pub agent_id: RecordId,
    pub agent_type: AgentType,
    pub object_id: RecordId,
    pub object_type: ObjectType,
    pub interaction_type: InteractionType,
    pub created_at: Millis,
}

impl Interaction {
    pub fn new(
        agent_id: RecordId,
        object_id: RecordId,
        object_type: ObjectType,
        interaction_type: InteractionType,
    ) -> Self {
        Self {
            id: 0,
            agent_id,
            agent_type: AgentType::Profile,
            object_id,
            object_type,
            interaction_type,
            created_at: crate::models::current_time_millis(),
        }
    }
}
