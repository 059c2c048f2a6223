//! Concept Arena - tower-defense battles fought with words
//!
//! The AI attacks with a concept, the player answers with another, and a
//! language-model oracle judges the clash. This crate is the turn orchestrator:
//! response window, resolution race, outcome application and the tutorial
//! overlay. Rendering and the oracle itself plug in through traits.

pub mod battle;
pub mod core;
pub mod llm;
pub mod onboarding;
