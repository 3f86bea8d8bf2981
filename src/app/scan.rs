//! Filesystem discovery of products and already-downloaded orbit files
//!
//! The download command can be pointed at a directory of Sentinel-1 scenes;
//! anything that parses as a product contributes a requirement, and products
//! whose acquisition is already covered by an orbit file sitting in the
//! output directory are skipped before any network work.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::app::products::{OrbitFile, Product};
use crate::errors::Result;

/// Scan a directory for entries that parse as Sentinel-1 products
///
/// Non-product entries are skipped silently (with a debug trace); an
/// unreadable directory is an error.
pub fn find_products(search_path: &Path) -> Result<Vec<Product>> {
    let mut products = Vec::new();

    for entry in fs::read_dir(search_path)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        match Product::parse(&name) {
            Ok(product) => products.push(product),
            Err(_) => debug!("Skipping {}, not a Sentinel-1 product", name),
        }
    }

    products.sort_by(|a, b| a.name.cmp(&b.name));
    products.dedup();
    Ok(products)
}

/// List orbit files already present in the output directory
pub fn find_existing_orbits(save_dir: &Path) -> Result<Vec<OrbitFile>> {
    let mut orbits = Vec::new();

    if !save_dir.exists() {
        return Ok(orbits);
    }

    for entry in fs::read_dir(save_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if let Ok(orbit) = OrbitFile::parse(&name) {
            orbits.push(orbit);
        }
    }

    Ok(orbits)
}

/// Drop products whose acquisition start is already covered by a local orbit
/// file for the same mission
pub fn uncovered_products(products: Vec<Product>, existing: &[OrbitFile]) -> Vec<Product> {
    products
        .into_iter()
        .filter(|product| {
            let covered = existing.iter().any(|orbit| {
                orbit.mission == product.mission && orbit.window.covers(product.start_time())
            });
            if covered {
                info!("Skipping {}, orbit file already present", product.name);
            }
            !covered
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SLC_NAME: &str =
        "S1A_IW_SLC__1SDV_20140807T043025_20140807T043053_021371_024C9B_1B70.zip";
    const EOF_NAME: &str =
        "S1A_OPER_AUX_POEORB_OPOD_20140828T122040_V20140806T225944_20140808T005944.EOF";

    #[test]
    fn test_find_products_ignores_non_products() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SLC_NAME), b"").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let products = find_products(dir.path()).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].absolute_orbit, 21371);
    }

    #[test]
    fn test_find_existing_orbits_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(find_existing_orbits(&missing).unwrap().is_empty());
    }

    #[test]
    fn test_uncovered_products_skips_covered_acquisitions() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(EOF_NAME), b"xml").unwrap();

        let existing = find_existing_orbits(dir.path()).unwrap();
        assert_eq!(existing.len(), 1);

        // Acquisition inside the EOF window for the same mission
        let covered = Product::parse(SLC_NAME).unwrap();
        // Same window but a different mission must not count as covered
        let other_mission = Product::parse(
            "S1B_IW_SLC__1SDV_20140807T043025_20140807T043053_021371_024C9B_1B70.zip",
        )
        .unwrap();

        let remaining = uncovered_products(vec![covered, other_mission.clone()], &existing);
        assert_eq!(remaining, vec![other_mission]);
    }
}
