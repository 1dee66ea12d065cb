//! Shared fixtures for integration tests.
#![allow(dead_code)]

use cartography::{
    BoundingBox, CartographyError, DepartmentAggregate, DirectoryEntry, DirectoryRepository,
    RegionAggregate, Result, SiteRecord, Viewport,
};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const FRANCE: [f64; 4] = [
    -3.8891601562500004,
    39.30029918615029,
    13.557128906250002,
    51.56341232867588,
];

pub fn france(zoom_level: i32) -> Viewport {
    Viewport::new(BoundingBox::from(FRANCE), zoom_level)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn site(id: &str, name: &str) -> SiteRecord {
    SiteRecord {
        id: id.to_string(),
        name: name.to_string(),
        address: format!("{} town hall", name),
        structure_type: "Mairie".to_string(),
        is_labeled: true,
        phone: None,
        contacts: Vec::new(),
    }
}

/// In-memory directory that counts how often each dataset is read.
#[derive(Default)]
pub struct StaticDirectory {
    pub regions: Vec<DirectoryEntry<RegionAggregate>>,
    pub departments: Vec<DirectoryEntry<DepartmentAggregate>>,
    pub sites: Vec<DirectoryEntry<SiteRecord>>,
    pub region_calls: AtomicUsize,
    pub department_calls: AtomicUsize,
    pub site_calls: AtomicUsize,
    pub sites_unavailable: bool,
}

impl StaticDirectory {
    /// Two regions, one department and two sites in metropolitan France.
    pub fn seeded() -> Self {
        Self {
            regions: vec![
                DirectoryEntry::new(
                    43.955,
                    6.053333,
                    RegionAggregate {
                        region: "Provence-Alpes-Côte d'Azur".to_string(),
                        count: 2,
                        bounding_zoom: 8,
                    },
                ),
                DirectoryEntry::new(
                    49.966111,
                    2.775278,
                    RegionAggregate {
                        region: "Hauts-de-France".to_string(),
                        count: 7,
                        bounding_zoom: 8,
                    },
                ),
            ],
            departments: vec![DirectoryEntry::new(
                45.7,
                4.8,
                DepartmentAggregate {
                    department: "Rhône".to_string(),
                    code: "69".to_string(),
                    count: 1,
                    bounding_zoom: 10,
                },
            )],
            sites: vec![
                DirectoryEntry::new(45.734377, 4.816864, site("lyon", "Lyon")),
                DirectoryEntry::new(43.305645, 5.380007, site("marseille", "Marseille")),
            ],
            ..Self::default()
        }
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl DirectoryRepository for StaticDirectory {
    async fn list_by_region(&self) -> Result<Vec<DirectoryEntry<RegionAggregate>>> {
        self.region_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.regions.clone())
    }

    async fn list_by_department(&self) -> Result<Vec<DirectoryEntry<DepartmentAggregate>>> {
        self.department_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.departments.clone())
    }

    async fn list_sites(&self) -> Result<Vec<DirectoryEntry<SiteRecord>>> {
        self.site_calls.fetch_add(1, Ordering::SeqCst);
        if self.sites_unavailable {
            return Err(CartographyError::upstream("site", "connection reset"));
        }
        Ok(self.sites.clone())
    }
}
