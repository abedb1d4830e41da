// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Collection entity tools
//!
//! File-backed collections keep one document per entity at
//! `<dir>/<slug>.json`. Aggregate collections keep every entity in an array
//! inside one document; those entities are addressed by `id` or `slug`, only
//! the matching element changes, and the whole document is rewritten.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::content::catalog::slugify;
use crate::content::{CollectionDef, CollectionStorage};
use crate::error::{PilotError, Result};
use crate::llm::provider::ToolDefinition;
use crate::tools::{
    FieldChange, SchemaBuilder, Tool, ToolContext, ToolPreview, ToolResult, ToolServices,
};

use super::{
    alias_note, apply_edits, load_document, load_or_empty, opt_str_arg, refresh_after, str_arg,
    value_arg, FieldEdit,
};

fn collection_arg<'a>(services: &'a ToolServices, args: &Value) -> Result<&'a CollectionDef> {
    let entity_type = str_arg(args, "entity_type")?;
    services.catalog.collection(entity_type).ok_or_else(|| {
        PilotError::InvalidInput(format!(
            "Unknown entity type '{}'. Valid types: {}",
            entity_type,
            services.catalog.collection_names().join(", ")
        ))
    })
}

/// File-backed ids are slugified the same way `create_entity` names them
fn entity_path(dir: &str, entity_id: &str) -> String {
    format!("{}/{}.json", dir, slugify(entity_id))
}

fn entity_label<'a>(collection: &CollectionDef, entity: &'a Value) -> Option<&'a str> {
    [collection.label_field.as_str(), "name", "title"]
        .iter()
        .find_map(|field| entity.get(*field).and_then(Value::as_str))
}

fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn identifier(entity: &Value, field: &str) -> Option<String> {
    id_string(entity.get(field))
}

/// Index of the aggregate element whose `id` or `slug` equals `entity_id`
fn find_element(items: &[Value], entity_id: &str) -> Option<usize> {
    items.iter().position(|item| {
        identifier(item, "id").as_deref() == Some(entity_id)
            || identifier(item, "slug").as_deref() == Some(entity_id)
    })
}

fn aggregate_items<'a>(doc: &'a Value, array_key: &str) -> &'a [Value] {
    doc.get(array_key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Copy of an aggregate document with its entity array replaced
fn with_items(doc: &Value, array_key: &str, items: Vec<Value>) -> Value {
    let mut map = doc.as_object().cloned().unwrap_or_default();
    map.insert(array_key.to_string(), Value::Array(items));
    Value::Object(map)
}

/// Tool for listing the entities of a collection
pub struct ListEntitiesTool;

#[async_trait]
impl Tool for ListEntitiesTool {
    fn name(&self) -> &str {
        "list_entities"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_entities".to_string(),
            description: "List entities of a collection (e.g. agents, listings, testimonials, faqs) with their id and label.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("entity_type", "Collection name, e.g. 'agents'", true)
                .build(),
        }
    }

    async fn execute(
        &self,
        args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult> {
        let collection = collection_arg(services, args)?;

        let entities: Vec<Value> = match &collection.storage {
            CollectionStorage::Files { dir } => services
                .content
                .list_by_prefix(ctx, &format!("{}/", dir))
                .await?
                .into_iter()
                .filter_map(|doc| {
                    let (_, slug) = services.catalog.collection_for_path(&doc.path)?;
                    Some(json!({
                        "id": slug,
                        "path": doc.path,
                        "label": entity_label(collection, &doc.content),
                    }))
                })
                .collect(),
            CollectionStorage::Aggregate { path, array_key } => {
                let doc = load_or_empty(services, ctx, path).await?;
                aggregate_items(&doc, array_key)
                    .iter()
                    .map(|item| {
                        json!({
                            "id": identifier(item, "id").or_else(|| identifier(item, "slug")),
                            "path": path,
                            "label": entity_label(collection, item),
                        })
                    })
                    .collect()
            }
        };

        Ok(ToolResult::success(
            "list_entities",
            format!("Found {} {}", entities.len(), collection.name),
        )
        .with_data(json!({ "entity_type": collection.name, "entities": entities })))
    }
}

/// Tool for reading one entity
pub struct ReadEntityTool;

#[async_trait]
impl Tool for ReadEntityTool {
    fn name(&self) -> &str {
        "read_entity"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "read_entity".to_string(),
            description: "Read one entity of a collection by its id or slug.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("entity_type", "Collection name, e.g. 'agents'", true)
                .string("entity_id", "Entity id or slug", true)
                .build(),
        }
    }

    async fn execute(
        &self,
        args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult> {
        let collection = collection_arg(services, args)?;
        let entity_id = str_arg(args, "entity_id")?;
        let what = format!("{} '{}'", collection.name, entity_id);

        let (path, entity) = match &collection.storage {
            CollectionStorage::Files { dir } => {
                let path = entity_path(dir, entity_id);
                let doc = load_document(services, ctx, &path, &what).await?;
                (path, doc)
            }
            CollectionStorage::Aggregate { path, array_key } => {
                let doc = load_document(services, ctx, path, &what).await?;
                let items = aggregate_items(&doc, array_key);
                let index = find_element(items, entity_id)
                    .ok_or_else(|| PilotError::NotFound(format!("{} not found", what)))?;
                (path.clone(), items[index].clone())
            }
        };

        Ok(ToolResult::success("read_entity", format!("Read {}", what)).with_data(json!({
            "entity_type": collection.name,
            "entity_id": entity_id,
            "path": path,
            "content": entity,
        })))
    }
}

/// Tool for updating one field of an entity
pub struct UpdateEntityFieldTool;

#[async_trait]
impl Tool for UpdateEntityFieldTool {
    fn name(&self) -> &str {
        "update_entity_field"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "update_entity_field".to_string(),
            description: "Set one field on a collection entity. Friendly field names are matched to the entity's actual keys.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("entity_type", "Collection name, e.g. 'agents'", true)
                .string("entity_id", "Entity id or slug", true)
                .string("field_path", "Dotted field path, e.g. 'phone' or 'address.city'", true)
                .any("new_value", "New value", true)
                .build(),
        }
    }

    fn is_mutating(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult> {
        let collection = collection_arg(services, args)?;
        let entity_id = str_arg(args, "entity_id")?;
        let field_path = str_arg(args, "field_path")?;
        let new_value = value_arg(args, "new_value")?;
        let what = format!("{} '{}'", collection.name, entity_id);
        let edit = vec![FieldEdit::new(field_path, new_value)];

        let (path, changes) = match &collection.storage {
            CollectionStorage::Files { dir } => {
                let path = entity_path(dir, entity_id);
                let doc = load_document(services, ctx, &path, &what).await?;
                let (updated, mut changes) = apply_edits(&services.aliases, &doc, edit)?;
                let stored = services.content.write(ctx, &path, updated).await?;
                refresh_after(&mut changes, &stored);
                (path, changes)
            }
            CollectionStorage::Aggregate { path, array_key } => {
                let doc = load_document(services, ctx, path, &what).await?;
                let mut items = aggregate_items(&doc, array_key).to_vec();
                let index = find_element(&items, entity_id)
                    .ok_or_else(|| PilotError::NotFound(format!("{} not found", what)))?;

                let (element, changes) = apply_edits(&services.aliases, &items[index], edit)?;
                items[index] = element;
                let updated = with_items(&doc, array_key, items);
                let stored = services.content.write(ctx, path, updated).await?;

                let mut changes: Vec<FieldChange> = changes
                    .into_iter()
                    .map(|c| FieldChange {
                        requested: format!("{}[{}].{}", array_key, index, c.requested),
                        resolved: format!("{}[{}].{}", array_key, index, c.resolved),
                        ..c
                    })
                    .collect();
                refresh_after(&mut changes, &stored);
                (path.clone(), changes)
            }
        };

        let summary = ctx.describe(format!(
            "Updated {} on {}{}",
            changes[0].resolved,
            what,
            alias_note(&changes)
        ));

        Ok(ToolResult::success("update_entity_field", summary)
            .with_data(json!({
                "entity_type": collection.name,
                "entity_id": entity_id,
                "field_path": changes[0].resolved,
            }))
            .with_changed_path(path.clone())
            .with_preview(ToolPreview::from_changes(path, &changes)))
    }
}

/// Slug for a new entity: explicit id, then `data.slug`, then the label
fn new_entity_slug(collection: &CollectionDef, args: &Value, data: &Map<String, Value>) -> Result<String> {
    let candidate = opt_str_arg(args, "entity_id")
        .map(str::to_string)
        .or_else(|| data.get("slug").and_then(Value::as_str).map(str::to_string))
        .or_else(|| {
            data.get(&collection.label_field)
                .and_then(Value::as_str)
                .map(str::to_string)
        });
    let slug = candidate.map(|c| slugify(&c)).unwrap_or_default();
    if slug.is_empty() {
        return Err(PilotError::InvalidInput(format!(
            "Cannot derive an id for the new {} entry; pass entity_id or include '{}' in data",
            collection.name, collection.label_field
        )));
    }
    Ok(slug)
}

/// Tool for creating an entity
pub struct CreateEntityTool;

#[async_trait]
impl Tool for CreateEntityTool {
    fn name(&self) -> &str {
        "create_entity"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "create_entity".to_string(),
            description: "Create a new entity in a collection. The id is taken from entity_id, data.slug, or derived from the entity's name.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("entity_type", "Collection name, e.g. 'agents'", true)
                .object("data", "Fields of the new entity", true)
                .string("entity_id", "Optional id / slug for the new entity", false)
                .build(),
        }
    }

    fn is_mutating(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult> {
        let collection = collection_arg(services, args)?;
        let data = args
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| PilotError::InvalidInput("data must be an object".to_string()))?;
        let slug = new_entity_slug(collection, args, data)?;
        let what = format!("{} '{}'", collection.name, slug);

        let (path, created) = match &collection.storage {
            CollectionStorage::Files { dir } => {
                let path = entity_path(dir, &slug);
                if services.content.read(ctx, &path).await?.is_some() {
                    return Err(PilotError::InvalidInput(format!("{} already exists", what)));
                }
                let stored = services
                    .content
                    .write(ctx, &path, Value::Object(data.clone()))
                    .await?;
                (path, stored)
            }
            CollectionStorage::Aggregate { path, array_key } => {
                let doc = load_or_empty(services, ctx, path).await?;
                let mut items = aggregate_items(&doc, array_key).to_vec();
                if find_element(&items, &slug).is_some() {
                    return Err(PilotError::InvalidInput(format!("{} already exists", what)));
                }
                let mut entity = data.clone();
                entity.insert("slug".to_string(), json!(slug));
                if id_string(entity.get("id")).is_none() {
                    entity.insert("id".to_string(), json!(slug));
                }
                items.push(Value::Object(entity));
                let index = items.len() - 1;
                let updated = with_items(&doc, array_key, items);
                let stored = services.content.write(ctx, path, updated).await?;
                let created = aggregate_items(&stored, array_key)
                    .get(index)
                    .cloned()
                    .unwrap_or(Value::Null);
                (path.clone(), created)
            }
        };

        Ok(
            ToolResult::success("create_entity", ctx.describe(format!("Created {}", what)))
                .with_data(json!({
                    "entity_type": collection.name,
                    "entity_id": slug,
                    "path": path,
                }))
                .with_changed_path(path.clone())
                .with_preview(ToolPreview::document(path, Value::Null, created)),
        )
    }
}

/// Tool for deleting an entity; requires `confirm: true`
pub struct RemoveEntityTool;

#[async_trait]
impl Tool for RemoveEntityTool {
    fn name(&self) -> &str {
        "remove_entity"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "remove_entity".to_string(),
            description: "Permanently delete an entity from a collection. Only call with confirm=true after the user has explicitly confirmed the deletion.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("entity_type", "Collection name, e.g. 'agents'", true)
                .string("entity_id", "Entity id or slug", true)
                .boolean("confirm", "Must be true to delete", true)
                .build(),
        }
    }

    fn is_mutating(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult> {
        if args.get("confirm").and_then(Value::as_bool) != Some(true) {
            return Err(PilotError::InvalidInput(
                "Deletion requires confirm=true; ask the user to confirm first".to_string(),
            ));
        }
        let collection = collection_arg(services, args)?;
        let entity_id = str_arg(args, "entity_id")?;
        let what = format!("{} '{}'", collection.name, entity_id);

        let (path, removed) = match &collection.storage {
            CollectionStorage::Files { dir } => {
                let path = entity_path(dir, entity_id);
                let doc = load_document(services, ctx, &path, &what).await?;
                services.content.remove(ctx, &path).await?;
                (path, doc)
            }
            CollectionStorage::Aggregate { path, array_key } => {
                let doc = load_document(services, ctx, path, &what).await?;
                let mut items = aggregate_items(&doc, array_key).to_vec();
                let index = find_element(&items, entity_id)
                    .ok_or_else(|| PilotError::NotFound(format!("{} not found", what)))?;
                let removed = items.remove(index);
                services
                    .content
                    .write(ctx, path, with_items(&doc, array_key, items))
                    .await?;
                (path.clone(), removed)
            }
        };

        Ok(
            ToolResult::success("remove_entity", ctx.describe(format!("Deleted {}", what)))
                .with_data(json!({ "entity_type": collection.name, "entity_id": entity_id }))
                .with_changed_path(path.clone())
                .with_preview(ToolPreview::document(path, removed, Value::Null)),
        )
    }
}
