//! Blog scenarios against the in-memory driver.

use crate::scenarios;
use crate::support::memory_blog;

#[test]
fn find_all_dedups_includes() {
    scenarios::find_all_dedups_includes(&memory_blog());
}

#[test]
fn find_record_side_loads_one_level() {
    scenarios::find_record_side_loads_one_level(&memory_blog());
}

#[test]
fn parent_scope_filters_children() {
    scenarios::parent_scope_filters_children(&memory_blog());
}

#[test]
fn create_without_id_generates_one() {
    scenarios::create_without_id_generates_one(&memory_blog());
}

#[test]
fn create_with_client_id_reports_nothing() {
    scenarios::create_with_client_id_reports_nothing(&memory_blog());
}

#[test]
fn create_links_belongs_to() {
    scenarios::create_links_belongs_to(&memory_blog());
}

#[test]
fn delete_missing_is_not_found() {
    scenarios::delete_missing_is_not_found(&memory_blog());
}

#[test]
fn update_rejects_mismatched_id() {
    scenarios::update_rejects_mismatched_id(&memory_blog());
}

#[test]
fn update_applies_attributes_and_linkage() {
    scenarios::update_applies_attributes_and_linkage(&memory_blog());
}

#[test]
fn update_rejects_unknown_attribute() {
    scenarios::update_rejects_unknown_attribute(&memory_blog());
}

#[test]
fn update_missing_is_not_found() {
    scenarios::update_missing_is_not_found(&memory_blog());
}

#[test]
fn update_rejects_wrongly_typed_attribute() {
    scenarios::update_rejects_wrongly_typed_attribute(&memory_blog());
}

#[test]
fn create_rejects_incomplete_record() {
    scenarios::create_rejects_incomplete_record(&memory_blog());
}

#[test]
fn integer_ids_are_typed() {
    scenarios::integer_ids_are_typed(&memory_blog());
}

#[test]
fn default_order_sorts_find_all() {
    scenarios::default_order_sorts_find_all(&memory_blog());
}

#[test]
fn find_record_fills_meta() {
    scenarios::find_record_fills_meta(&memory_blog());
}

#[test]
fn delete_drops_own_links() {
    scenarios::delete_drops_own_links(&memory_blog());
}

#[test]
fn delete_drops_links_pointing_at_the_record() {
    use jsonapi_driver::{schema, Driver};

    let driver = memory_blog();
    driver.delete(&schema::<crate::support::Tag>(), "t1").unwrap();
    driver.insert_model(&crate::support::tag("t1", "rust, again")).unwrap();

    let doc = driver
        .find_record(&schema::<crate::support::Article>(), "a2", "")
        .unwrap();
    let tags = doc.data.unwrap().relationship("tags").unwrap().data.clone();
    assert!(tags.resource_ids.is_empty());
}

#[test]
fn clones_share_storage() {
    let driver = memory_blog();
    let clone = driver.clone();
    clone.insert_model(&crate::support::tag("t3", "axum")).unwrap();
    assert_eq!(driver.count("tags").unwrap(), 3);
}
