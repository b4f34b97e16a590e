//! Client side of the activity sign-up board: fetch the directory, render it,
//! register or unregister participants and report the result.
pub mod board_client;
pub mod confirmer;
pub mod controller;
pub mod directory_getter;
pub mod error;
pub mod feedback;
pub mod helpers;
pub mod models;
pub mod renderer;
pub mod roster_mutator;
