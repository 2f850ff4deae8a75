//! Storage layer
//!
//! `JsonStore`: 범용 JSON key-value 저장소 (완성된 원고 등 영속 아티팩트용)

mod json;

pub use json::JsonStore;
