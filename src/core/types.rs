//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

/// Which tower a value refers to.
///
/// The AI always attacks and the player always defends, so the attacker's
/// tower is the AI's and the defender's tower is the player's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    /// Label used in messages ("AI" / "Player")
    pub fn label(self) -> &'static str {
        match self {
            Self::Attacker => "AI",
            Self::Defender => "Player",
        }
    }
}

/// Unique identifier for a resolved turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(pub Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque handle to whatever the animation layer spawned for a concept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VisualRef(pub u64);

/// Boxed, sendable future returned by collaborator traits
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
