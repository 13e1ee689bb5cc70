//! Declarative schema definitions.
//!
//! ```toml
//! [[entities]]
//! name = "Post"
//! fields = ["id", "title"]
//! associations = [
//!     { name = "author", entity = "User", cardinality = "one" },
//!     { name = "comments", entity = "Comment", cardinality = "many" },
//! ]
//! ```

use serde::{Deserialize, Serialize};

use super::{Cardinality, EntityDef, Schema, SchemaError, SchemaResult};

/// Root of a schema definition file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub entities: Vec<EntityDefinition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityDefinition {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub associations: Vec<AssociationDefinition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssociationDefinition {
    pub name: String,
    pub entity: String,
    #[serde(default = "default_cardinality")]
    pub cardinality: Cardinality,
}

fn default_cardinality() -> Cardinality {
    Cardinality::One
}

impl SchemaDefinition {
    pub fn into_schema(self) -> SchemaResult<Schema> {
        self.entities
            .into_iter()
            .fold(Schema::builder(), |builder, entity| {
                let def = entity.associations.into_iter().fold(
                    EntityDef::new(&entity.name)
                        .with_fields(entity.fields.iter().map(|f| f.as_str())),
                    |def, assoc| {
                        def.with_association(&assoc.name, &assoc.entity, assoc.cardinality)
                    },
                );
                builder.entity(def)
            })
            .build()
    }
}

impl Schema {
    /// Load a schema from a TOML definition.
    pub fn from_toml(source: &str) -> SchemaResult<Self> {
        let definition: SchemaDefinition =
            toml::from_str(source).map_err(|e| SchemaError::Parse(e.to_string()))?;
        definition.into_schema()
    }

    /// Load a schema from a JSON definition.
    pub fn from_json(source: &str) -> SchemaResult<Self> {
        let definition: SchemaDefinition =
            serde_json::from_str(source).map_err(|e| SchemaError::Parse(e.to_string()))?;
        definition.into_schema()
    }
}
