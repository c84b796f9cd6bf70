//! Loads the five variable files from disk into typed trees.

use std::fs;
use std::path::Path;

use log::debug;

use super::{
    BaseVars, FabricVars, InterfaceVars, RouteVars, TenantVars, VarsError,
};

pub const BASE_FILE: &str = "base.yml";
pub const FABRIC_FILE: &str = "fabric.yml";
pub const TENANT_FILE: &str = "service_tenant.yml";
pub const INTERFACE_FILE: &str = "service_interface.yml";
pub const ROUTE_FILE: &str = "service_route.yml";

/// All five variable trees, parsed but not yet validated.
#[derive(Debug, Clone)]
pub struct AllVars {
    pub base: BaseVars,
    pub fabric: FabricVars,
    pub tenant: TenantVars,
    pub interface: InterfaceVars,
    pub route: RouteVars,
}

fn load_file<T: serde::de::DeserializeOwned>(
    dir: &Path,
    file: &str,
) -> Result<T, VarsError> {
    let path = dir.join(file);
    debug!("loading {}", path.display());
    let text = fs::read_to_string(&path).map_err(|source| VarsError::Io {
        file: file.to_string(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| VarsError::Parse {
        file: file.to_string(),
        source,
    })
}

/// Reads every variable file under `dir`. Fails on the first file that
/// is missing or does not match the expected shape.
pub fn load_all(dir: &Path) -> Result<AllVars, VarsError> {
    Ok(AllVars {
        base: load_file(dir, BASE_FILE)?,
        fabric: load_file(dir, FABRIC_FILE)?,
        tenant: load_file(dir, TENANT_FILE)?,
        interface: load_file(dir, INTERFACE_FILE)?,
        route: load_file(dir, ROUTE_FILE)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_all(dir.path()).unwrap_err();
        match err {
            VarsError::Io { file, .. } => assert_eq!(file, BASE_FILE),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(BASE_FILE), "device_name: [not, a, map]")
            .unwrap();
        let err = load_all(dir.path()).unwrap_err();
        match err {
            VarsError::Parse { file, .. } => assert_eq!(file, BASE_FILE),
            other => panic!("unexpected error: {other}"),
        }
    }
}
