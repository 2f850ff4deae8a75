//! # inkdraft-foundation
//!
//! Foundation layer for Inkdraft:
//! - Error: 중앙 에러 타입 (`Error`, `Result`)
//! - Config: 통합 설정 (`InkdraftConfig`)
//! - Storage: JSON key-value 저장소 (`JsonStore`)

pub mod config;
pub mod error;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{InkdraftConfig, ProviderConfig, ServerConfig, TaskConfig, CONFIG_FILE};

// ============================================================================
// Storage
// ============================================================================
pub use storage::JsonStore;
