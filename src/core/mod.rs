//! # Core Application Logic
//!
//! The session controller. It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • effects (async I/O)  │
//!                    └───────────┬─────────────┘
//!                                │
//!                  ┌─────────────┴─────────────┐
//!                  ▼                           ▼
//!           ┌────────────┐              ┌────────────┐
//!           │    TUI     │              │    CLI     │
//!           │  Adapter   │              │ (analyze,  │
//!           │ (ratatui)  │              │  health)   │
//!           └────────────┘              └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, all session state in one place
//! - [`action`]: `Action`, `Effect` and the `update()` reducer
//! - [`effects`]: Runs effects against a `DiagnosisBackend`
//! - [`config`]: Layered configuration

pub mod action;
pub mod config;
pub mod effects;
pub mod state;
