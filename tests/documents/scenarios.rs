//! Driver-agnostic scenarios, run against every driver over the blog fixture.

use std::collections::HashSet;

use jsonapi_driver::{
    schema, DocItem, Driver, DriverError, Relationship, RelationshipData, Resource,
    ResourceIdentifier,
};

use crate::support::{Article, Comment, Person, Release, Report, Tag};

fn ids(resources: &[Resource]) -> Vec<(&str, &str)> {
    resources
        .iter()
        .map(|r| (r.resource_type.as_str(), r.id.as_str()))
        .collect()
}

fn linked(resource: &Resource, name: &str) -> Vec<String> {
    resource
        .relationship(name)
        .map(|rel| rel.data.resource_ids.iter().map(|i| i.id.clone()).collect())
        .unwrap_or_default()
}

pub fn find_all_dedups_includes(driver: &dyn Driver) {
    let doc = driver.find_all(&schema::<Article>(), None, "").unwrap();

    assert_eq!(doc.data.len(), 3);
    assert_eq!(
        doc.jsonapi.as_ref().map(|j| j.version.as_str()),
        Some("1.0")
    );

    // p1 and t1 are referenced twice but side-loaded once
    let included = ids(&doc.included);
    let unique: HashSet<_> = included.iter().collect();
    assert_eq!(unique.len(), included.len());
    assert_eq!(
        included,
        vec![
            ("people", "p1"),
            ("comments", "c1"),
            ("comments", "c2"),
            ("tags", "t1"),
            ("tags", "t2"),
            ("people", "p2"),
            ("comments", "c3"),
        ]
    );

    let a1 = &doc.data[0];
    assert_eq!(a1.id, "a1");
    assert_eq!(linked(a1, "author"), vec!["p1"]);
    assert_eq!(linked(a1, "comments"), vec!["c1", "c2"]);
    assert_eq!(linked(a1, "tags"), vec!["t1", "t2"]);

    let a3 = &doc.data[2];
    let tags = a3.relationship("tags").unwrap();
    assert!(!tags.data.is_single);
    assert!(tags.data.resource_ids.is_empty());
}

pub fn find_record_side_loads_one_level(driver: &dyn Driver) {
    let doc = driver.find_record(&schema::<Article>(), "a1", "").unwrap();
    let data = doc.data.as_ref().unwrap();

    assert_eq!(data.resource_type, "articles");
    assert_eq!(data.attribute("title").unwrap(), "Notes on the Analytical Engine");
    assert_eq!(data.attribute("published"), Some(&serde_json::json!(true)));
    assert!(data.attribute("authorId").is_none());
    assert_eq!(doc.included.len(), 5);

    // Comments are side-loaded without their own author linkage
    let c1 = doc
        .included
        .iter()
        .find(|r| r.resource_type == "comments" && r.id == "c1")
        .unwrap();
    let author = c1.relationship("author").unwrap();
    assert!(author.data.is_single);
    assert!(author.data.single().is_none());
}

pub fn parent_scope_filters_children(driver: &dyn Driver) {
    let scoped = driver.find_all(&schema::<Comment>(), Some("a1"), "").unwrap();
    assert_eq!(ids(&scoped.data), vec![("comments", "c1"), ("comments", "c2")]);

    // c1 by p2, c2 by p1
    assert_eq!(ids(&scoped.included), vec![("people", "p2"), ("people", "p1")]);

    let all = driver.find_all(&schema::<Comment>(), None, "").unwrap();
    assert_eq!(all.data.len(), 3);

    // Parent id is ignored for models without a parent key
    let people = driver.find_all(&schema::<Person>(), Some("a1"), "").unwrap();
    assert_eq!(people.data.len(), 2);
}

pub fn create_without_id_generates_one(driver: &dyn Driver) {
    let mut resource = Resource::new("", "people");
    resource.set_attribute("firstName", "Grace");
    resource.set_attribute("lastName", "Hopper");
    resource.set_attribute("age", &85);

    let created = driver
        .create(&schema::<Person>(), &DocItem::new(resource))
        .unwrap()
        .expect("generated id is reported back");
    let data = created.data.unwrap();
    assert!(!data.id.is_empty());
    assert_eq!(data.resource_type, "people");

    let fetched = driver.find_record(&schema::<Person>(), &data.id, "").unwrap();
    let fetched = fetched.data.unwrap();
    assert_eq!(fetched.id, data.id);
    assert_eq!(fetched.attribute("firstName").unwrap(), "Grace");
}

pub fn create_with_client_id_reports_nothing(driver: &dyn Driver) {
    let mut resource = Resource::new("t9", "tags");
    resource.set_attribute("label", "serde");

    let created = driver
        .create(&schema::<Tag>(), &DocItem::new(resource.clone()))
        .unwrap();
    assert!(created.is_none());

    let err = driver
        .create(&schema::<Tag>(), &DocItem::new(resource))
        .unwrap_err();
    assert!(matches!(err, DriverError::Conflict { .. }));

    let doc = driver.find_record(&schema::<Tag>(), "t9", "").unwrap();
    assert_eq!(doc.data.unwrap().attribute("label").unwrap(), "serde");
}

pub fn create_links_belongs_to(driver: &dyn Driver) {
    let mut resource = Resource::new("a9", "articles");
    resource.set_attribute("title", "On Computable Numbers");
    resource.set_attribute("published", &false);
    resource.relationships.insert(
        "author".into(),
        Relationship {
            data: RelationshipData::one(ResourceIdentifier::new("p2", "people")),
            ..Relationship::default()
        },
    );

    driver
        .create(&schema::<Article>(), &DocItem::new(resource))
        .unwrap();

    let doc = driver.find_record(&schema::<Article>(), "a9", "").unwrap();
    assert_eq!(linked(doc.data.as_ref().unwrap(), "author"), vec!["p2"]);
    assert_eq!(ids(&doc.included), vec![("people", "p2")]);
}

pub fn delete_missing_is_not_found(driver: &dyn Driver) {
    let err = driver.delete(&schema::<Person>(), "nope").unwrap_err();
    assert_eq!(err, DriverError::not_found("people", "nope"));

    driver.delete(&schema::<Tag>(), "t2").unwrap();
    assert!(driver
        .find_record(&schema::<Tag>(), "t2", "")
        .unwrap_err()
        .is_not_found());
    assert!(driver
        .delete(&schema::<Tag>(), "t2")
        .unwrap_err()
        .is_not_found());
}

pub fn update_rejects_mismatched_id(driver: &dyn Driver) {
    let mut resource = Resource::new("a2", "articles");
    resource.set_attribute("title", "Hijacked");

    let err = driver
        .update(&schema::<Article>(), "a1", &DocItem::new(resource))
        .unwrap_err();
    assert!(matches!(err, DriverError::Validation(_)));

    for id in ["a1", "a2"] {
        let doc = driver.find_record(&schema::<Article>(), id, "").unwrap();
        assert_ne!(doc.data.unwrap().attribute("title").unwrap(), "Hijacked");
    }
}

pub fn update_applies_attributes_and_linkage(driver: &dyn Driver) {
    let mut resource = Resource::new("a2", "articles");
    resource.set_attribute("title", "Sketch, revised");
    resource.relationships.insert(
        "author".into(),
        Relationship {
            data: RelationshipData::one(ResourceIdentifier::new("p2", "people")),
            ..Relationship::default()
        },
    );

    driver
        .update(&schema::<Article>(), "a2", &DocItem::new(resource))
        .unwrap();

    let doc = driver.find_record(&schema::<Article>(), "a2", "").unwrap();
    let data = doc.data.as_ref().unwrap();
    assert_eq!(data.attribute("title").unwrap(), "Sketch, revised");
    assert_eq!(data.attribute("published"), Some(&serde_json::json!(true)));
    assert_eq!(linked(data, "author"), vec!["p2"]);
}

pub fn update_rejects_unknown_attribute(driver: &dyn Driver) {
    let mut resource = Resource::new("p1", "people");
    resource.set_attribute("nickname", "Countess");

    let err = driver
        .update(&schema::<Person>(), "p1", &DocItem::new(resource))
        .unwrap_err();
    assert_eq!(
        err,
        DriverError::Validation("unknown attribute 'nickname' for type 'people'".into())
    );
}

pub fn update_missing_is_not_found(driver: &dyn Driver) {
    let mut resource = Resource::new("p9", "people");
    resource.set_attribute("age", &1);

    let err = driver
        .update(&schema::<Person>(), "p9", &DocItem::new(resource))
        .unwrap_err();
    assert!(err.is_not_found());
}

pub fn update_rejects_wrongly_typed_attribute(driver: &dyn Driver) {
    let mut resource = Resource::new("p1", "people");
    resource.set_attribute("age", "old");

    let err = driver
        .update(&schema::<Person>(), "p1", &DocItem::new(resource))
        .unwrap_err();
    assert!(matches!(err, DriverError::Validation(_)));

    let people = driver.find_all(&schema::<Person>(), None, "").unwrap();
    assert_eq!(people.data.len(), 2);
    assert_eq!(people.data[0].attribute("age"), Some(&serde_json::json!(36)));
}

pub fn create_rejects_incomplete_record(driver: &dyn Driver) {
    let mut resource = Resource::new("", "people");
    resource.set_attribute("firstName", "Grace");

    let err = driver
        .create(&schema::<Person>(), &DocItem::new(resource))
        .unwrap_err();
    assert!(matches!(err, DriverError::Validation(_)));

    let people = driver.find_all(&schema::<Person>(), None, "").unwrap();
    assert_eq!(ids(&people.data), vec![("people", "p1"), ("people", "p2")]);
}

fn release(id: &str, version: &str, rank: i64) -> DocItem {
    let mut resource = Resource::new(id, "releases");
    resource.set_attribute("version", version);
    resource.set_attribute("rank", &rank);
    DocItem::new(resource)
}

pub fn integer_ids_are_typed(driver: &dyn Driver) {
    let releases = schema::<Release>();

    assert!(driver.create(&releases, &release("5", "0.5.0", 1)).unwrap().is_none());
    let doc = driver.find_record(&releases, "5", "").unwrap();
    assert_eq!(doc.data.unwrap().id, "5");

    let err = driver
        .create(&releases, &release("five", "0.6.0", 2))
        .unwrap_err();
    assert!(matches!(err, DriverError::Validation(_)));

    let created = driver
        .create(&releases, &release("", "0.7.0", 3))
        .unwrap()
        .expect("generated id is reported back");
    assert_eq!(created.data.unwrap().id, "6");

    assert_eq!(driver.find_all(&releases, None, "").unwrap().data.len(), 2);
}

pub fn default_order_sorts_find_all(driver: &dyn Driver) {
    let releases = schema::<Release>();
    driver.create(&releases, &release("1", "1.0.0", 2)).unwrap();
    driver.create(&releases, &release("2", "2.0.0", 9)).unwrap();
    driver.create(&releases, &release("3", "1.5.0", 5)).unwrap();

    let doc = driver.find_all(&releases, None, "").unwrap();
    assert_eq!(
        ids(&doc.data),
        vec![("releases", "2"), ("releases", "3"), ("releases", "1")]
    );
}

pub fn find_record_fills_meta(driver: &dyn Driver) {
    let mut resource = Resource::new("r1", "reports");
    resource.set_attribute("title", "Readers");
    resource.set_attribute("data", &serde_json::json!({ "visits": 12 }));
    driver
        .create(&schema::<Report>(), &DocItem::new(resource))
        .unwrap();

    let doc = driver.find_record(&schema::<Report>(), "r1", "").unwrap();
    assert_eq!(doc.meta.get("data"), Some(&serde_json::json!({ "visits": 12 })));
    assert_eq!(doc.meta.get("people"), Some(&serde_json::json!(2)));
    let data = doc.data.unwrap();
    assert!(data.attribute("data").is_none());
    assert_eq!(data.attribute("title").unwrap(), "Readers");

    // Collections are left alone
    let all = driver.find_all(&schema::<Report>(), None, "").unwrap();
    assert!(all.meta.is_empty());
    assert!(all.data[0].attribute("data").is_some());
}

pub fn delete_drops_own_links(driver: &dyn Driver) {
    driver.delete(&schema::<Article>(), "a1").unwrap();

    let mut resource = Resource::new("a1", "articles");
    resource.set_attribute("title", "Notes, again");
    resource.set_attribute("published", &false);
    driver
        .create(&schema::<Article>(), &DocItem::new(resource))
        .unwrap();

    let doc = driver.find_record(&schema::<Article>(), "a1", "").unwrap();
    assert!(linked(doc.data.as_ref().unwrap(), "tags").is_empty());

    let a2 = driver.find_record(&schema::<Article>(), "a2", "").unwrap();
    assert_eq!(linked(a2.data.as_ref().unwrap(), "tags"), vec!["t1"]);
}
