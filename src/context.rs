//! Attributes captured once from the Lambda execution environment.

use crate::{Attr, Level};

/// Environment variable holding the service name.
pub const SERVICE_NAME_ENV: &str = "POWERTOOLS_SERVICE_NAME";
/// Environment variable holding the function name.
pub const FUNCTION_NAME_ENV: &str = "AWS_LAMBDA_FUNCTION_NAME";
/// Environment variable holding the configured memory size in MB.
pub const FUNCTION_MEMORY_SIZE_ENV: &str = "AWS_LAMBDA_FUNCTION_MEMORY_SIZE";
/// Environment variable holding the Powertools log level.
pub const POWERTOOLS_LOG_LEVEL_ENV: &str = "POWERTOOLS_LOG_LEVEL";
/// Environment variable set by Lambda's advanced logging controls.
pub const LAMBDA_LOG_LEVEL_ENV: &str = "AWS_LAMBDA_LOG_LEVEL";

pub const SERVICE_KEY: &str = "service";
pub const FUNCTION_NAME_KEY: &str = "function_name";
pub const FUNCTION_MEMORY_SIZE_KEY: &str = "function_memory_size";

/// Context fields attached to every record a handler emits.
///
/// Every field is optional; absent, empty or malformed values are omitted
/// rather than emitted as empty strings or zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LambdaContext {
    pub service: Option<String>,
    pub function_name: Option<String>,
    pub memory_size: Option<u64>,
    /// Level floor requested by the environment.
    pub log_level: Option<Level>,
}

impl LambdaContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the context from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Capture the context through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            service: var(SERVICE_NAME_ENV),
            function_name: var(FUNCTION_NAME_ENV),
            memory_size: var(FUNCTION_MEMORY_SIZE_ENV).and_then(|v| v.parse().ok()),
            log_level: var(POWERTOOLS_LOG_LEVEL_ENV)
                .and_then(|v| v.parse().ok())
                .or_else(|| var(LAMBDA_LOG_LEVEL_ENV).and_then(|v| v.parse().ok())),
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    pub fn with_memory_size(mut self, size: u64) -> Self {
        self.memory_size = Some(size);
        self
    }

    pub fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// The context as attributes, in emission order.
    pub fn attrs(&self) -> Vec<Attr> {
        let mut attrs = Vec::with_capacity(3);
        if let Some(service) = &self.service {
            attrs.push(Attr::string(SERVICE_KEY, service.as_str()));
        }
        if let Some(name) = &self.function_name {
            attrs.push(Attr::string(FUNCTION_NAME_KEY, name.as_str()));
        }
        if let Some(size) = self.memory_size {
            attrs.push(Attr::uint(FUNCTION_MEMORY_SIZE_KEY, size));
        }
        attrs
    }
}
