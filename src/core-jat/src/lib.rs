mod common;

pub use common::cors_config::{CorsConfig, CorsConfigError, DEFAULT_ALLOWED_ORIGINS};
pub use common::db_env::{DEFAULT_MAX_CONNECTIONS, DbEnvError, get_database_url, get_db_pool, parse_max_connections};
pub use common::health::health_check;
pub use common::hostname::{DEFAULT_HOST, DEFAULT_PORT, HostPortError, get_api_base_url, parse_host_port};
pub use common::logging::setup_logging;
