//! Shopflow Core
//!
//! Core types for the Shopflow batch pipeline.
//!
//! This crate contains:
//! - Domain types: runs, step results, schedule configuration
//! - Errors: the transient/fatal step failure taxonomy
//! - DTOs: the persisted run report

pub mod domain;
pub mod dto;
pub mod error;
