//! Inkdraft configuration
//!
//! TOML 파일 (`inkdraft.toml`) + 환경 변수 오버라이드

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 설정 파일명
pub const CONFIG_FILE: &str = "inkdraft.toml";

// ============================================================================
// Inkdraft Config (통합)
// ============================================================================

/// Inkdraft 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InkdraftConfig {
    /// HTTP 서버 설정
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM 프로바이더 설정
    #[serde(default)]
    pub provider: ProviderConfig,

    /// 백그라운드 태스크 설정
    #[serde(default)]
    pub tasks: TaskConfig,
}

/// HTTP 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// LLM 프로바이더 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (환경 변수 `OPENAI_API_KEY` 우선)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// 모델 이름
    #[serde(default = "default_model")]
    pub model: String,

    /// OpenAI 호환 API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// 요청 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// 백그라운드 태스크 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// 완료된 태스크 보관 기간 (초)
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// 정리 주기 (초)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7860
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_retention_secs() -> u64 {
    24 * 60 * 60
}

fn default_cleanup_interval_secs() -> u64 {
    10 * 60
}

impl InkdraftConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 파일에서 로드 (없으면 기본값) 후 환경 변수 적용
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new(CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::new()
                }
            }
        };

        config.apply_env();
        Ok(config)
    }

    /// TOML 파일에서 로드
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// 환경 변수 오버라이드 적용
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.provider.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("INKDRAFT_BASE_URL") {
            if !url.is_empty() {
                self.provider.base_url = Some(url);
            }
        }
        if let Ok(model) = std::env::var("INKDRAFT_MODEL") {
            if !model.is_empty() {
                self.provider.model = model;
            }
        }
    }
}
