//! Test domain: a small blog with people, articles, comments, and tags.

use jsonapi_driver::{
    schema, DocItem, Driver, DriverError, MemoryDriver, MetaFiller, Model, ToResource,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model, ToResource)]
#[jsonapi(type = "people")]
pub struct Person {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model, ToResource)]
pub struct Tag {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Model, ToResource)]
#[jsonapi(type = "comments", parent = "article_id")]
pub struct Comment {
    pub id: String,
    pub body: String,
    #[jsonapi(foreign_key)]
    pub article_id: Option<String>,
    pub author_id: Option<String>,
    #[jsonapi(belongs_to)]
    pub author: Option<Person>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Model, ToResource)]
#[jsonapi(type = "articles")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub published: bool,
    pub author_id: Option<String>,
    #[jsonapi(belongs_to)]
    pub author: Option<Person>,
    #[serde(default)]
    #[jsonapi(has_many, foreign_key = "article_id")]
    pub comments: Vec<Comment>,
    #[serde(default)]
    #[jsonapi(many_to_many)]
    pub tags: Vec<Tag>,
}

/// Integer ids, listed newest rank first.
#[derive(Debug, Clone, Serialize, Deserialize, Model, ToResource)]
#[jsonapi(type = "releases", order = "rank desc")]
pub struct Release {
    pub id: i64,
    pub version: String,
    pub rank: i64,
}

/// Single fetches carry `meta.data` and a head count of people.
#[derive(Debug, Clone, Serialize, Deserialize, Model, ToResource)]
#[jsonapi(type = "reports", meta)]
pub struct Report {
    pub id: String,
    pub title: String,
    pub data: serde_json::Value,
}

impl MetaFiller for Report {
    fn add_meta(driver: &dyn Driver, doc: &mut DocItem) -> Result<(), DriverError> {
        let people = driver.find_all(&schema::<Person>(), None, "")?;
        doc.meta.insert("people".to_string(), people.data.len().into());
        Ok(())
    }
}

pub fn person(id: &str, first_name: &str, last_name: &str, age: i64) -> Person {
    Person {
        id: id.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        age,
    }
}

pub fn tag(id: &str, label: &str) -> Tag {
    Tag {
        id: id.to_string(),
        label: label.to_string(),
    }
}

pub fn comment(id: &str, body: &str, article_id: &str, author_id: &str) -> Comment {
    Comment {
        id: id.to_string(),
        body: body.to_string(),
        article_id: Some(article_id.to_string()),
        author_id: Some(author_id.to_string()),
        author: None,
    }
}

pub fn article(id: &str, title: &str, author_id: &str) -> Article {
    Article {
        id: id.to_string(),
        title: title.to_string(),
        published: true,
        author_id: Some(author_id.to_string()),
        author: None,
        comments: Vec::new(),
        tags: Vec::new(),
    }
}

/// Anything the fixture can be loaded into.
pub trait Seed {
    fn put<M: Model>(&self, model: &M) -> Result<(), DriverError>;
    fn link(&self, join_table: &str, source_id: &str, target_id: &str) -> Result<(), DriverError>;
}

impl Seed for MemoryDriver {
    fn put<M: Model>(&self, model: &M) -> Result<(), DriverError> {
        self.insert_model(model)
    }

    fn link(&self, join_table: &str, source_id: &str, target_id: &str) -> Result<(), DriverError> {
        MemoryDriver::link(self, join_table, source_id, target_id)
    }
}

#[cfg(feature = "sqlite")]
impl Seed for jsonapi_driver::SqliteDriver {
    fn put<M: Model>(&self, model: &M) -> Result<(), DriverError> {
        self.insert_model(model)
    }

    fn link(&self, join_table: &str, source_id: &str, target_id: &str) -> Result<(), DriverError> {
        jsonapi_driver::SqliteDriver::link(self, join_table, source_id, target_id)
    }
}

/// Two people, three articles, three comments, two tags.
///
/// a1 (by p1) has comments c1, c2 and tags t1, t2; a2 (by p1) has tag t1;
/// a3 (by p2) has comment c3.
pub fn load_blog<S: Seed>(store: &S) -> Result<(), DriverError> {
    store.put(&person("p1", "Ada", "Lovelace", 36))?;
    store.put(&person("p2", "Alan", "Turing", 41))?;

    store.put(&tag("t1", "rust"))?;
    store.put(&tag("t2", "jsonapi"))?;

    store.put(&article("a1", "Notes on the Analytical Engine", "p1"))?;
    store.put(&article("a2", "Sketch of the Engine", "p1"))?;
    store.put(&article("a3", "Computing Machinery", "p2"))?;

    store.put(&comment("c1", "Brilliant", "a1", "p2"))?;
    store.put(&comment("c2", "Thanks!", "a1", "p1"))?;
    store.put(&comment("c3", "Can machines think?", "a3", "p2"))?;

    store.link("articles_tags", "a1", "t1")?;
    store.link("articles_tags", "a1", "t2")?;
    store.link("articles_tags", "a2", "t1")?;
    Ok(())
}

pub fn memory_blog() -> MemoryDriver {
    let driver = MemoryDriver::new();
    load_blog(&driver).unwrap();
    driver
}

#[cfg(feature = "sqlite")]
pub fn sqlite_blog() -> jsonapi_driver::SqliteDriver {
    let driver = jsonapi_driver::SqliteDriver::open_in_memory().unwrap();
    driver.ensure_table(&schema::<Person>()).unwrap();
    driver.ensure_table(&schema::<Tag>()).unwrap();
    driver.ensure_table(&schema::<Comment>()).unwrap();
    driver.ensure_table(&schema::<Article>()).unwrap();
    driver.ensure_table(&schema::<Release>()).unwrap();
    driver.ensure_table(&schema::<Report>()).unwrap();
    load_blog(&driver).unwrap();
    driver
}
