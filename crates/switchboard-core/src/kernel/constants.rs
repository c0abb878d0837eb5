/// Engine name, used in log output
pub const ENGINE_NAME: &str = "Switchboard";

/// Current plugin API version. Plugins declaring `compatible_api_versions`
/// are checked against this unless the registry config overrides it.
pub const API_VERSION: &str = "0.1.0";
