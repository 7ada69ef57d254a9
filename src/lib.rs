//! # Policy Brain
//!
//! Self-play reinforcement learning for turn-based board games. A
//! hand-rolled feedforward network is trained by a policy gradient agent
//! from discounted game outcomes held in a fixed-capacity experience buffer.
//!
//! ## Modules
//!
//! - [`brain`] - Activations, layers and the backpropagating [`brain::Network`]
//! - [`ai`] - Agent trait, policy gradient agent, random opponent
//! - [`game`] - Game interface and board feature encoding
//! - [`training`] - Game runner, experience buffer, metrics, trainer
//! - [`checkpoint`] - Network snapshots and checkpoint management
//! - [`config`] - TOML configuration loading and validation
//! - [`error`] - Structured error types

pub mod ai;
pub mod brain;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod game;
pub mod training;
