// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Structured JSON content: field paths, friendly aliases and persistence

pub mod aliases;
pub mod catalog;
pub mod media;
pub mod mirror;
pub mod path;
pub mod sqlite;
pub mod store;

pub use aliases::{resolve_friendly_field_path, FieldAliases, ResolvedPath};
pub use catalog::{CatalogConfig, CollectionDef, CollectionStorage};
pub use media::{DocumentMediaLibrary, MediaAsset, MediaLibrary};
pub use mirror::FileMirror;
pub use path::{get_value, set_value, PathSegment};
pub use sqlite::SqliteDocuments;
pub use store::{ContentStore, DualContentStore, StoredDocument};
