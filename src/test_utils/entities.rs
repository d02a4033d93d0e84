use std::time::Duration;

use crate::config_entity;
use crate::ConfigEntity;
use crate::EntityTypeBuilder;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Person {
    pub name: String,
    pub age: i32,
}

impl ConfigEntity for Person {
    fn describe(entity: &mut EntityTypeBuilder<Self>) {
        entity.field("name", |p| &p.name, |p, v| p.name = v);
        entity.field("age", |p| &p.age, |p, v| p.age = v);
    }
}

/// Extends [`Person`] and overrides its `age` field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Employee {
    pub person: Person,
    pub employee_id: i64,
    pub badge: Option<String>,
    pub manager: Option<Person>,
}

impl ConfigEntity for Employee {
    fn describe(entity: &mut EntityTypeBuilder<Self>) {
        entity.inherit(|e| &e.person, |e| &mut e.person);
        entity.field("age", |e| &e.person.age, |e, v| e.person.age = v);
        entity.field("employee_id", |e| &e.employee_id, |e, v| e.employee_id = v);
        entity.field("badge", |e| &e.badge, |e, v| e.badge = v).no_copy();
        entity.field("manager", |e| &e.manager, |e, v| e.manager = v);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Team {
    pub name: String,
    pub members: Vec<Person>,
    pub tags: Vec<String>,
}

impl ConfigEntity for Team {
    fn describe(entity: &mut EntityTypeBuilder<Self>) {
        entity.field("name", |t| &t.name, |t, v| t.name = v);
        entity.field("members", |t| &t.members, |t, v| t.members = v);
        entity.field("tags", |t| &t.tags, |t, v| t.tags = v);
    }
}

/// Holds a list of itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Category {
    pub name: String,
    pub subcategories: Vec<Category>,
}

impl ConfigEntity for Category {
    fn describe(entity: &mut EntityTypeBuilder<Self>) {
        entity.field("name", |c| &c.name, |c, v| c.name = v);
        entity.field("subcategories", |c| &c.subcategories, |c, v| c.subcategories = v);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Endpoint {
    pub host: String,
    pub port: i32,
    pub timeout: Duration,
    pub secure: bool,
}

impl ConfigEntity for Endpoint {
    fn describe(entity: &mut EntityTypeBuilder<Self>) {
        entity.field("host", |e| &e.host, |e, v| e.host = v);
        entity.field("port", |e| &e.port, |e, v| e.port = v);
        entity.field("timeout", |e| &e.timeout, |e, v| e.timeout = v).child_name("timeout-after");
        entity.field("secure", |e| &e.secure, |e, v| e.secure = v);
    }
}

config_entity!(Person, Employee, Team, Category, Endpoint);
