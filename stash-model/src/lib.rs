//! Entity model for stash.
//!
//! A single declarative [`FieldSet`] per entity type drives two artifacts:
//! - a [`StorageIndexSpec`] telling the table store which fields to index and
//!   which one is the auto-increment key
//! - a [`ValidationSchema`] enforced on every write
//!
//! # Example
//!
//! ```
//! use stash_model::{EntityDefinition, FieldDefinition, rules, validate};
//! use stash_types::Fields;
//!
//! let guitars = EntityDefinition::builder("guitars", "Guitar")
//!     .field(
//!         "name",
//!         FieldDefinition::string()
//!             .indexed()
//!             .required()
//!             .validate(rules::non_empty_string("Name")),
//!     )
//!     .field("description", FieldDefinition::string().validate(rules::string("Description")))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(guitars.storage_schema().to_string(), "++id,created_at,updated_at,name");
//!
//! let errors = validate(&Fields::new().with("name", "   "), &guitars.validation_schema());
//! assert_eq!(errors, vec!["Name must be a non-empty string".to_string()]);
//! ```

mod compile;
mod entity;
mod error;
mod field;
pub mod rules;
mod validate;

pub use compile::{
    IndexDirective, StorageIndexSpec, compile_storage_schema, compile_validation_schema,
    compile_validation_schema_for,
};
pub use entity::{EntityDefinition, EntityDefinitionBuilder, base_fields};
pub use error::{SchemaError, SchemaResult, ValidationError};
pub use field::{FieldDefinition, FieldSet, FieldType};
pub use validate::{Rule, ValidationSchema, validate, validate_or_reject};
