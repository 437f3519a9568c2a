//! Picking a driver by name from configuration.

use jsonapi_driver::{
    schema, Driver, DriverConfig, DriverError, DriverRegistry, Includes, MemoryDriver,
};

use crate::support::{load_blog, person, Person};

#[test]
fn open_configured_driver() {
    let config = DriverConfig::from_json(r#"{ "adapter": "none" }"#).unwrap();
    let registry = DriverRegistry::with_defaults();

    let driver = registry.open(&config.adapter).unwrap();
    driver.connect(&config).unwrap();
    let doc = driver.find_all(&schema::<Person>(), None, "").unwrap();
    assert!(doc.data.is_empty());

    let edsger = person("p7", "Edsger", "Dijkstra", 72);
    let resource = driver.to_resource(&edsger, &mut Includes::new());
    assert_eq!(resource.id, "p7");
    assert_eq!(resource.attribute("lastName").unwrap(), "Dijkstra");
}

#[test]
fn unknown_adapter_is_rejected() {
    let registry = DriverRegistry::with_defaults();
    let err = registry.open("mongo").err().unwrap();
    assert_eq!(err, DriverError::UnknownDriver("mongo".into()));
    assert_eq!(err.status_code(), 500);
}

fn seeded_memory() -> Box<dyn Driver> {
    let driver = MemoryDriver::new();
    load_blog(&driver).unwrap();
    Box::new(driver)
}

#[test]
fn custom_factories_can_be_registered() {
    let mut registry = DriverRegistry::new();
    registry.register("fixture", seeded_memory);
    assert_eq!(registry.names(), vec!["fixture".to_string()]);

    let driver = registry.open("fixture").unwrap();
    let doc = driver.find_all(&schema::<Person>(), None, "").unwrap();
    assert_eq!(doc.data.len(), 2);
}
