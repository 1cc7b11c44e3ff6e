/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! The message instance catalog: which concrete type backs a message
//! contract, and which type names the distributor knows about.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::trace;

use crate::common::MessageTypeKey;
use crate::message::MissiveError;
use crate::traits::MissiveMessage;

/// Builds a fresh payload for a message type.
pub type InstanceFactory<T> = Arc<dyn Fn() -> T + Send + Sync + 'static>;

type ErasedFactory = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Default)]
pub(crate) struct MessageCatalog {
    declarations: DashMap<TypeId, ErasedFactory>,
    resolved: RwLock<HashMap<TypeId, ErasedFactory>>,
    names: DashMap<String, MessageTypeKey>,
    resolutions: AtomicUsize,
}

impl MessageCatalog {
    pub(crate) fn declare_factory<T: MissiveMessage>(&self, factory: InstanceFactory<T>) {
        let key = MessageTypeKey::of::<T>();
        trace!(message_type = %key, "declaring instance factory");
        self.declarations.insert(key.type_id(), Arc::new(factory));
        self.resolved.write().remove(&key.type_id());
        self.remember(key);
    }

    /// Resolves the factory for `T`, caching the outcome.
    ///
    /// A declaration wins over `fallback`. Without either the type is
    /// unresolved and nothing is cached.
    pub(crate) fn resolve<T: MissiveMessage>(
        &self,
        fallback: Option<fn() -> T>,
    ) -> Result<InstanceFactory<T>, MissiveError> {
        let type_id = TypeId::of::<T>();
        if let Some(factory) = self.cached::<T>(&self.resolved.read()) {
            return Ok(factory);
        }

        let mut resolved = self.resolved.write();
        if let Some(factory) = self.cached::<T>(&resolved) {
            return Ok(factory);
        }

        let declared = self
            .declarations
            .get(&type_id)
            .and_then(|erased| downcast_factory::<T>(erased.value()));
        let factory = match (declared, fallback) {
            (Some(factory), _) => factory,
            (None, Some(fallback)) => Arc::new(fallback) as InstanceFactory<T>,
            (None, None) => {
                return Err(MissiveError::UnresolvedMessageType(std::any::type_name::<T>()))
            }
        };

        self.resolutions.fetch_add(1, Ordering::Relaxed);
        resolved.insert(type_id, Arc::new(factory.clone()));
        drop(resolved);
        self.remember(MessageTypeKey::of::<T>());
        Ok(factory)
    }

    fn cached<T: MissiveMessage>(
        &self,
        resolved: &HashMap<TypeId, ErasedFactory>,
    ) -> Option<InstanceFactory<T>> {
        resolved
            .get(&TypeId::of::<T>())
            .and_then(downcast_factory::<T>)
    }

    /// Makes a type findable by its full and short names.
    pub(crate) fn remember(&self, key: MessageTypeKey) {
        self.names.insert(key.name().to_string(), key);
        self.names.entry(key.short_name().to_string()).or_insert(key);
    }

    /// Looks up a type by full or short name.
    ///
    /// # Errors
    /// [`MissiveError::InvalidArgument`] if the name is blank or unknown.
    pub(crate) fn lookup(&self, name: &str) -> Result<MessageTypeKey, MissiveError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MissiveError::InvalidArgument(
                "message type name must not be blank".to_string(),
            ));
        }
        self.names
            .get(name)
            .map(|entry| *entry.value())
            .ok_or_else(|| MissiveError::InvalidArgument(format!("unknown message type `{name}`")))
    }

    pub(crate) fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::Relaxed)
    }
}

fn downcast_factory<T: MissiveMessage>(erased: &ErasedFactory) -> Option<InstanceFactory<T>> {
    erased.downcast_ref::<InstanceFactory<T>>().cloned()
}
