//! Nutribot — conversational calorie and meal-plan agent core.

pub mod agent;
pub mod channels;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod llm;
pub mod plan;
pub mod profile;
pub mod store;
