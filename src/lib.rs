//! Pokedex browser and six-slot team builder.
//!
//! The library holds the state, reducer and effects so they can be tested
//! without a terminal; `main.rs` wires them into the tui-dispatch runtime.

pub mod action;
pub mod api;
pub mod config;
pub mod effect;
pub mod error;
pub mod persist;
pub mod reducer;
pub mod state;
pub mod stats;
pub mod team;
pub mod toast;
pub mod ui;
