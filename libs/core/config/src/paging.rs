use crate::{env_parse_or, ConfigError, FromEnv};

/// Paging defaults applied to list queries
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PagingConfig {
    /// Page size used when a request does not ask for one
    pub default_page_size: u32,
    /// Upper bound for any requested page size
    pub max_page_size: u32,
}

impl PagingConfig {
    pub fn new(default_page_size: u32, max_page_size: u32) -> Self {
        Self {
            default_page_size,
            max_page_size,
        }
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            max_page_size: 100,
        }
    }
}

impl FromEnv for PagingConfig {
    /// Reads:
    /// - `DEFAULT_PAGE_SIZE` (optional, default: 25)
    /// - `MAX_PAGE_SIZE` (optional, default: 100)
    fn from_env() -> Result<Self, ConfigError> {
        let default_page_size: u32 = env_parse_or("DEFAULT_PAGE_SIZE", "25")?;
        let max_page_size: u32 = env_parse_or("MAX_PAGE_SIZE", "100")?;

        if default_page_size == 0 || max_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DEFAULT_PAGE_SIZE/MAX_PAGE_SIZE".to_string(),
                details: "page sizes must be positive".to_string(),
            });
        }

        if default_page_size > max_page_size {
            return Err(ConfigError::InvalidValue {
                key: "DEFAULT_PAGE_SIZE".to_string(),
                details: format!(
                    "default page size {} exceeds maximum {}",
                    default_page_size, max_page_size
                ),
            });
        }

        Ok(Self {
            default_page_size,
            max_page_size,
        })
    }
}
