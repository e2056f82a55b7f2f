use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "CareLink";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address when PORTAL_BIND is unset
const DEFAULT_BIND: &str = "127.0.0.1:8600";

/// Get the application data directory
/// ~/CareLink/ on all platforms
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("CareLink")
}

/// Database path: PORTAL_DB_PATH, or portal.db in the app data directory
pub fn database_path() -> PathBuf {
    match std::env::var("PORTAL_DB_PATH") {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => app_data_dir().join("portal.db"),
    }
}

/// Bind address: PORTAL_BIND, or 127.0.0.1:8600
pub fn bind_addr() -> Result<SocketAddr, std::net::AddrParseError> {
    std::env::var("PORTAL_BIND")
        .unwrap_or_else(|_| DEFAULT_BIND.to_string())
        .parse()
}

pub fn default_log_filter() -> &'static str {
    "info,carelink=debug"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("CareLink"));
    }

    #[test]
    fn database_path_defaults_under_app_data() {
        if std::env::var("PORTAL_DB_PATH").is_err() {
            let path = database_path();
            assert!(path.starts_with(app_data_dir()));
            assert!(path.ends_with("portal.db"));
        }
    }

    #[test]
    fn default_bind_parses() {
        if std::env::var("PORTAL_BIND").is_err() {
            let addr = bind_addr().unwrap();
            assert_eq!(addr.port(), 8600);
        }
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
