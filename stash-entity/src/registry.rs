//! Lazily constructed, one-per-type entity instances.
//!
//! An [`EntityRegistry`] owns a table backend and hands out exactly one
//! [`Entity`] per [`EntityKind`], building and loading it on first request
//! so its cache already mirrors storage when handed out. A single
//! registry can be installed process-wide with
//! [`EntityRegistry::install_global`]; [`entity_accessors!`] then generates
//! plain accessor functions over it.
//!
//! [`entity_accessors!`]: crate::entity_accessors

use crate::cache::SnapshotReceiver;
use crate::config::StashConfig;
use crate::entity::Entity;
use crate::error::{EntityError, EntityResult};
use stash_model::{EntityDefinition, SchemaError};
use stash_storage::TableProvider;
use stash_types::{Clock, SystemClock};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;
use tracing::info;

static GLOBAL: OnceLock<EntityRegistry> = OnceLock::new();

/// A statically known entity type.
///
/// ```
/// use stash_entity::EntityKind;
/// use stash_model::{EntityDefinition, FieldDefinition, SchemaError, rules};
///
/// struct Guitars;
///
/// impl EntityKind for Guitars {
///     const NAME: &'static str = "guitars";
///
///     fn definition() -> Result<EntityDefinition, SchemaError> {
///         EntityDefinition::builder(Self::NAME, "Guitar")
///             .field(
///                 "name",
///                 FieldDefinition::string()
///                     .indexed()
///                     .required()
///                     .validate(rules::non_empty_string("Name")),
///             )
///             .build()
///     }
/// }
/// ```
pub trait EntityKind: 'static {
    /// Registry key and table name.
    const NAME: &'static str;

    /// Builds the definition. Called once, on first access.
    fn definition() -> Result<EntityDefinition, SchemaError>;
}

/// Owns one [`Entity`] per kind over a shared backend.
pub struct EntityRegistry {
    backend: Arc<dyn TableProvider>,
    clock: Arc<dyn Clock>,
    entities: Mutex<HashMap<&'static str, Arc<Entity>>>,
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("backend", &self.backend.kind())
            .finish_non_exhaustive()
    }
}

impl EntityRegistry {
    /// Creates a registry stamping with the system clock.
    pub fn new(backend: Arc<dyn TableProvider>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(backend: Arc<dyn TableProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            entities: Mutex::new(HashMap::new()),
        }
    }

    /// Opens the configured backend and wraps it.
    pub fn from_config(config: &StashConfig) -> EntityResult<Self> {
        Ok(Self::new(config.open_backend()?))
    }

    pub fn backend(&self) -> &Arc<dyn TableProvider> {
        &self.backend
    }

    /// The entity for `K`, constructed and loaded on first call.
    ///
    /// Every later call returns the same instance. Concurrent first calls
    /// wait for a single construction. A definition or load error is
    /// returned without caching, so the next call tries again.
    pub async fn entity<K: EntityKind>(&self) -> EntityResult<Arc<Entity>> {
        let mut entities = self.entities.lock().await;
        if let Some(entity) = entities.get(K::NAME) {
            return Ok(Arc::clone(entity));
        }
        let entity = Entity::open(
            K::definition()?,
            self.backend.as_ref(),
            Arc::clone(&self.clock),
        )
        .await?;
        let loaded = entity.load().await?;
        let entity = Arc::new(entity);
        entities.insert(K::NAME, Arc::clone(&entity));
        info!(
            entity = K::NAME,
            backend = self.backend.kind(),
            count = loaded.len(),
            "Constructed entity"
        );
        Ok(entity)
    }

    /// Subscribes to the cache of `K`'s entity.
    pub async fn store<K: EntityKind>(&self) -> EntityResult<SnapshotReceiver> {
        Ok(self.entity::<K>().await?.subscribe())
    }

    /// Number of entities constructed so far.
    pub async fn len(&self) -> usize {
        self.entities.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Installs `registry` as the process-wide registry.
    ///
    /// Fails with [`EntityError::RegistryAlreadyInstalled`] on the second call.
    pub fn install_global(registry: Self) -> EntityResult<&'static Self> {
        GLOBAL
            .set(registry)
            .map_err(|_| EntityError::RegistryAlreadyInstalled)?;
        Self::global()
    }

    /// The process-wide registry.
    pub fn global() -> EntityResult<&'static Self> {
        GLOBAL.get().ok_or(EntityError::RegistryNotInstalled)
    }
}

/// Generates process-wide accessors for an entity kind.
///
/// `entity_accessors!(Guitars => get_guitars_entity, guitars);` expands to
/// the async functions `get_guitars_entity()`, returning the shared
/// [`Entity`], and `guitars()`, returning a cache subscription. Both read the
/// registry installed with [`EntityRegistry::install_global`].
#[macro_export]
macro_rules! entity_accessors {
    ($kind:ty => $entity_fn:ident, $store_fn:ident) => {
        pub async fn $entity_fn() -> $crate::EntityResult<::std::sync::Arc<$crate::Entity>> {
            $crate::EntityRegistry::global()?.entity::<$kind>().await
        }

        pub async fn $store_fn() -> $crate::EntityResult<$crate::SnapshotReceiver> {
            $crate::EntityRegistry::global()?.store::<$kind>().await
        }
    };
}
