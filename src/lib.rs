// src/lib.rs
pub mod canvas;
pub mod colour;
pub mod config;
pub mod drivers;
pub mod engine;
pub mod grid;
pub mod gui;
pub mod types;
pub mod visualizer;
