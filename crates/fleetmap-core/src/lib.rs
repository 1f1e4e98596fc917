//! Fleetmap Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Fleetmap
//! topology layout engine and its collaborators. It includes:
//!
//! - **Identifiers**: String-interned node keys ([`identifier::Id`])
//! - **Colors**: Color hints with CSS color support ([`color::Color`])
//! - **Geometry**: Points, boxes, rings and polar vectors ([`geometry`] module)
//! - **Model**: The discovery records consumed by the engine ([`model`] module)

pub mod color;
pub mod geometry;
pub mod identifier;
pub mod model;
