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
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::common::{MessageCatalog, MessageTypeKey};
use crate::handler::MessageHandlerConfiguration;
use crate::message::MissiveError;
use crate::traits::HandlerConfiguration;

/// Applies the same permissions to several handlers at once.
///
/// Returned by [`MessageDistributor::register_handlers`](crate::common::MessageDistributor::register_handlers).
/// Registrations fan out to every member. Permission queries hold only if
/// they hold for every member.
#[derive(Debug)]
pub struct AggregateHandlerConfiguration {
    configurations: Vec<Arc<MessageHandlerConfiguration>>,
    catalog: Arc<MessageCatalog>,
    owns_handler: AtomicBool,
}

impl AggregateHandlerConfiguration {
    pub(crate) fn new(
        configurations: Vec<Arc<MessageHandlerConfiguration>>,
        catalog: Arc<MessageCatalog>,
        owns_handler: bool,
    ) -> Self {
        Self {
            configurations,
            catalog,
            owns_handler: AtomicBool::new(owns_handler),
        }
    }

    pub fn configurations(&self) -> &[Arc<MessageHandlerConfiguration>] {
        &self.configurations
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }
}

impl HandlerConfiguration for AggregateHandlerConfiguration {
    fn register_for_send_type(&self, key: MessageTypeKey) -> &Self {
        for configuration in &self.configurations {
            configuration.register_for_send_type(key);
        }
        self
    }

    fn register_for_receive_type(&self, key: MessageTypeKey) -> &Self {
        for configuration in &self.configurations {
            configuration.register_for_receive_type(key);
        }
        self
    }

    fn can_send_type(&self, key: MessageTypeKey) -> bool {
        self.configurations.iter().all(|c| c.can_send_type(key))
    }

    fn can_receive_type(&self, key: MessageTypeKey) -> bool {
        self.configurations.iter().all(|c| c.can_receive_type(key))
    }

    /// The members' common value when they all agree, otherwise the value
    /// last set on the aggregate.
    fn owns_handler(&self) -> bool {
        let mut values = self.configurations.iter().map(|c| c.owns_handler());
        match values.next() {
            Some(first) if values.all(|value| value == first) => first,
            _ => self.owns_handler.load(Ordering::SeqCst),
        }
    }

    fn set_owns_handler(&self, owns_handler: bool) -> &Self {
        self.owns_handler.store(owns_handler, Ordering::SeqCst);
        for configuration in &self.configurations {
            configuration.set_owns_handler(owns_handler);
        }
        self
    }

    fn resolve_message_type(&self, name: &str) -> Result<MessageTypeKey, MissiveError> {
        self.catalog.lookup(name)
    }
}
