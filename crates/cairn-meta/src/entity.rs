//! The annotated entity and the [`Traceable`] capability.

use std::collections::BTreeSet;
use std::sync::Arc;

use cairn_types::{Document, Record};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::annotation::{Comment, Link};
use crate::context::Context;
use crate::error::{MetaError, MetaResult};
use crate::timestamp;

/// Id given to the first comment or link of an entity.
const FIRST_ID: u64 = 1;

/// Keys an [`Entity`] owns in its head record. Everything else is extra.
const OWN_KEYS: [&str; 5] = ["name", "description", "tags", "comments", "links"];

/// Anything that can describe itself as a metadata document.
pub trait Traceable {
    /// Render the current state as a document, head record first.
    fn get_meta(&self) -> Document;
}

/// An identity plus free-form annotations.
///
/// Comment and link ids are counters local to the entity. They only grow,
/// so an id is never handed out twice even after its annotation is removed.
#[derive(Clone, Debug)]
pub struct Entity {
    name: String,
    description: Option<String>,
    tags: BTreeSet<String>,
    comments: Vec<Comment>,
    links: Vec<Link>,
    extra: Record,
    lineage: Vec<Record>,
    next_comment_id: u64,
    next_link_id: u64,
    context: Arc<Context>,
}

impl Entity {
    /// A new entity named with a generated slug.
    pub fn new(context: Arc<Context>) -> Self {
        let name = context.slug();
        Self::named(context, name)
    }

    pub fn named(context: Arc<Context>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            tags: BTreeSet::new(),
            comments: Vec::new(),
            links: Vec::new(),
            extra: Record::new(),
            lineage: Vec::new(),
            next_comment_id: FIRST_ID,
            next_link_id: FIRST_ID,
            context,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Set or replace the description.
    pub fn describe(&mut self, text: impl Into<String>) {
        self.description = Some(text.into());
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Add tags. Duplicates collapse.
    pub fn tag<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
    }

    /// Remove tags. Tags that are not present are ignored.
    pub fn remove_tag<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self.tags.remove(tag.as_ref());
        }
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Append a comment stamped with the context's user and host.
    pub fn comment(&mut self, message: impl Into<String>) -> &Comment {
        let id = self.next_comment_id;
        self.next_comment_id += 1;
        self.comments.push(Comment {
            id: id.to_string(),
            message: message.into(),
            user: self.context.user().to_string(),
            host: self.context.host().to_string(),
            timestamp: timestamp::now(),
        });
        &self.comments[self.comments.len() - 1]
    }

    pub fn remove_comment(&mut self, id: &str) -> MetaResult<Comment> {
        let pos = self
            .comments
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| MetaError::CommentNotFound(id.to_string()))?;
        Ok(self.comments.remove(pos))
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Link this entity to another thing.
    ///
    /// With a `target`, its name and location fill in whatever `name` and
    /// `uri` leave out, and its whole document is embedded when `include` is
    /// set. Fails when the result would carry neither a name, a uri, nor
    /// embedded metadata.
    pub fn link(
        &mut self,
        target: Option<&dyn Traceable>,
        name: Option<&str>,
        uri: Option<&str>,
        include: bool,
    ) -> MetaResult<&Link> {
        let target_meta = target.map(|t| t.get_meta());
        let from_target = |keys: &[&str]| {
            target_meta.as_ref().and_then(|doc| {
                keys.iter()
                    .find_map(|k| doc.get(k).and_then(Value::as_str))
                    .map(str::to_string)
            })
        };

        let name = name.map(str::to_string).or_else(|| from_target(&["name"]));
        let uri = uri
            .map(str::to_string)
            .or_else(|| from_target(&["uri", "root", "path"]));
        let meta = if include { target_meta.clone() } else { None };

        if name.is_none() && uri.is_none() && meta.is_none() {
            return Err(MetaError::InvalidArgument(
                "a link needs a target, a name or a uri".into(),
            ));
        }

        let id = self.next_link_id;
        self.next_link_id += 1;
        self.links.push(Link {
            id: id.to_string(),
            name,
            uri,
            meta,
            created_at: timestamp::now(),
        });
        Ok(&self.links[self.links.len() - 1])
    }

    pub fn remove_link(&mut self, id: &str) -> MetaResult<Link> {
        let pos = self
            .links
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| MetaError::LinkNotFound(id.to_string()))?;
        Ok(self.links.remove(pos))
    }

    /// Fields of the head record that are not annotations.
    pub fn extra(&self) -> &Record {
        &self.extra
    }

    /// Set one extra field.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.insert(key.into(), value.into());
    }

    pub fn remove_extra(&mut self, key: &str) -> Option<Value> {
        self.extra.remove(key)
    }

    /// Layer fields over the extras, replacing keys that already exist.
    pub fn update_meta(&mut self, fields: Record) {
        for (key, value) in fields {
            if key == "name" {
                if let Value::String(name) = value {
                    self.name = name;
                }
                continue;
            }
            self.extra.insert(key, value);
        }
    }

    /// Replace in-memory state with what `document` describes.
    ///
    /// Id counters resume after the largest numeric id found, so annotations
    /// added afterwards never collide with persisted ones.
    pub fn from_meta(&mut self, document: &Document) -> MetaResult<()> {
        let head = document.head().cloned().unwrap_or_default();

        if let Some(name) = head.get("name").and_then(Value::as_str) {
            self.name = name.to_string();
        }
        self.description = match head.get("description") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        let tags: Vec<String> = decode_list(&head, "tags")?;
        self.tags = tags.into_iter().collect();
        self.comments = decode_list(&head, "comments")?;
        self.links = decode_list(&head, "links")?;

        self.next_comment_id = next_id(self.comments.iter().map(|c| c.id.as_str()));
        self.next_link_id = next_id(self.links.iter().map(|l| l.id.as_str()));

        self.extra = head
            .into_iter()
            .filter(|(k, _)| !OWN_KEYS.contains(&k.as_str()))
            .collect();
        self.lineage = document.lineage().to_vec();
        Ok(())
    }
}

impl Traceable for Entity {
    fn get_meta(&self) -> Document {
        let mut head = Record::new();
        head.insert("name".into(), Value::from(self.name.clone()));
        head.insert(
            "description".into(),
            self.description.clone().map_or(Value::Null, Value::from),
        );
        head.insert(
            "tags".into(),
            Value::Array(self.tags.iter().cloned().map(Value::from).collect()),
        );
        head.insert("comments".into(), to_list(&self.comments));
        head.insert("links".into(), to_list(&self.links));
        for (key, value) in &self.extra {
            head.insert(key.clone(), value.clone());
        }
        Document::from_record(head).chain(Document::from(self.lineage.clone()))
    }
}

fn decode_list<T: DeserializeOwned>(head: &Record, key: &str) -> MetaResult<Vec<T>> {
    match head.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| MetaError::InvalidMeta(format!("field `{key}`: {e}"))),
    }
}

fn to_list<T: serde::Serialize>(items: &[T]) -> Value {
    Value::Array(
        items
            .iter()
            .filter_map(|item| serde_json::to_value(item).ok())
            .collect(),
    )
}

fn next_id<'a>(ids: impl Iterator<Item = &'a str>) -> u64 {
    ids.filter_map(|id| id.parse::<u64>().ok())
        .max()
        .map_or(FIRST_ID, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> Arc<Context> {
        Arc::new(Context::new("ada", "engine").with_seed(1))
    }

    #[test]
    fn default_name_is_a_slug() {
        let entity = Entity::new(ctx());
        assert_eq!(entity.name().split('-').count(), 3);
    }

    #[test]
    fn tags_are_a_set() {
        let mut e = Entity::named(ctx(), "e");
        e.tag(["b", "a", "b"]);
        e.tag(vec!["c".to_string()]);
        e.remove_tag(["c", "never-added"]);
        assert_eq!(e.get_meta().get("tags"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn comment_ids_are_never_reused() {
        let mut e = Entity::named(ctx(), "e");
        assert_eq!(e.comment("first").id, "1");
        let id = e.comment("second").id.clone();
        assert_eq!(id, "2");
        e.remove_comment(&id).unwrap();
        assert_eq!(e.comment("third").id, "3");

        let c = &e.comments()[0];
        assert_eq!((c.user.as_str(), c.host.as_str()), ("ada", "engine"));
    }

    #[test]
    fn removing_unknown_annotations_fails() {
        let mut e = Entity::named(ctx(), "e");
        assert!(matches!(e.remove_comment("9"), Err(MetaError::CommentNotFound(_))));
        assert!(matches!(e.remove_link("9"), Err(MetaError::LinkNotFound(_))));
    }

    #[test]
    fn link_requires_something_to_point_at() {
        let mut e = Entity::named(ctx(), "e");
        let err = e.link(None, None, None, true).unwrap_err();
        assert!(matches!(err, MetaError::InvalidArgument(_)));
        assert!(e.links().is_empty());
    }

    #[test]
    fn link_embeds_or_omits_target_meta() {
        let mut target = Entity::named(ctx(), "upstream");
        target.set("root", "/data/upstream");
        let mut e = Entity::named(ctx(), "e");

        let embedded = e.link(Some(&target), None, None, true).unwrap().clone();
        assert_eq!(embedded.name.as_deref(), Some("upstream"));
        assert_eq!(embedded.uri.as_deref(), Some("/data/upstream"));
        assert_eq!(embedded.meta, Some(target.get_meta()));

        let reference = e.link(Some(&target), Some("renamed"), None, false).unwrap();
        assert_eq!(reference.name.as_deref(), Some("renamed"));
        assert_eq!(reference.uri.as_deref(), Some("/data/upstream"));
        assert!(reference.meta.is_none());

        let bare = e.link(None, None, Some("s3://bucket/key"), true).unwrap();
        assert_eq!(bare.id, "3");
        assert!(bare.meta.is_none());
    }

    #[test]
    fn meta_has_annotation_keys_and_extras() {
        let mut e = Entity::named(ctx(), "e");
        e.describe("about");
        e.set("type", "line");
        let doc = e.get_meta();
        assert_eq!(doc.len(), 1);
        for key in ["name", "description", "tags", "comments", "links", "type"] {
            assert!(doc.get(key).is_some(), "missing {key}");
        }
        assert_eq!(doc.get("description"), Some(&json!("about")));
    }

    #[test]
    fn from_meta_restores_state_and_counters() {
        let mut original = Entity::named(ctx(), "orig");
        original.tag(["x"]);
        original.comment("a");
        original.comment("b");
        original.link(None, Some("n"), None, false).unwrap();
        original.set("len", 3);
        let doc = original.get_meta().chain(Document::from_value(json!({"name": "parent"})).unwrap());

        let mut restored = Entity::new(ctx());
        restored.from_meta(&doc).unwrap();
        assert_eq!(restored.name(), "orig");
        assert_eq!(restored.get_meta(), doc);

        assert_eq!(restored.comment("c").id, "3");
        assert_eq!(restored.link(None, Some("m"), None, false).unwrap().id, "2");
        assert_eq!(restored.extra().get("len"), Some(&json!(3)));
    }

    #[test]
    fn from_meta_rejects_malformed_annotations() {
        let doc = Document::from_value(json!({"comments": [{"message": 1}]})).unwrap();
        let err = Entity::new(ctx()).from_meta(&doc).unwrap_err();
        assert!(matches!(err, MetaError::InvalidMeta(_)));
    }

    #[test]
    fn update_meta_overrides_extras() {
        let mut e = Entity::named(ctx(), "e");
        e.set("a", 1);
        let mut fields = Record::new();
        fields.insert("a".into(), json!(2));
        fields.insert("name".into(), json!("renamed"));
        e.update_meta(fields);
        assert_eq!(e.extra().get("a"), Some(&json!(2)));
        assert_eq!(e.name(), "renamed");
    }
}
