//! API-wide constants.

/// Path prefix shared by every JSON endpoint.
pub const API_PREFIX: &str = "/api";

/// Service name reported by the health endpoint.
pub const SERVICE_NAME: &str = "skyframe";
