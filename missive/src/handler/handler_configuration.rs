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
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::common::{HandlerId, MessageCatalog, MessageTypeKey};
use crate::message::MissiveError;
use crate::traits::HandlerConfiguration;

#[derive(Default)]
struct Permissions {
    send: HashSet<MessageTypeKey>,
    receive: HashSet<MessageTypeKey>,
}

/// Send and receive permissions of one registered handler.
///
/// Returned by [`MessageDistributor::register_handler`](crate::common::MessageDistributor::register_handler).
/// A handler starts with no permissions: it can neither send nor receive
/// until types are registered.
pub struct MessageHandlerConfiguration {
    handler_id: HandlerId,
    handler_name: String,
    catalog: Arc<MessageCatalog>,
    permissions: Mutex<Permissions>,
    owns_handler: AtomicBool,
}

impl MessageHandlerConfiguration {
    pub(crate) fn new(
        handler_id: HandlerId,
        handler_name: String,
        catalog: Arc<MessageCatalog>,
        owns_handler: bool,
    ) -> Self {
        Self {
            handler_id,
            handler_name,
            catalog,
            permissions: Mutex::new(Permissions::default()),
            owns_handler: AtomicBool::new(owns_handler),
        }
    }

    pub fn handler_id(&self) -> HandlerId {
        self.handler_id
    }

    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    /// The types this handler may send.
    pub fn send_types(&self) -> Vec<MessageTypeKey> {
        self.permissions.lock().send.iter().copied().collect()
    }

    /// The types this handler may receive.
    pub fn receive_types(&self) -> Vec<MessageTypeKey> {
        self.permissions.lock().receive.iter().copied().collect()
    }
}

impl HandlerConfiguration for MessageHandlerConfiguration {
    fn register_for_send_type(&self, key: MessageTypeKey) -> &Self {
        if self.permissions.lock().send.insert(key) {
            trace!(handler = %self.handler_id, message_type = %key, "registered for send");
        }
        self.catalog.remember(key);
        self
    }

    fn register_for_receive_type(&self, key: MessageTypeKey) -> &Self {
        if self.permissions.lock().receive.insert(key) {
            trace!(handler = %self.handler_id, message_type = %key, "registered for receive");
        }
        self.catalog.remember(key);
        self
    }

    fn can_send_type(&self, key: MessageTypeKey) -> bool {
        self.permissions.lock().send.contains(&key)
    }

    fn can_receive_type(&self, key: MessageTypeKey) -> bool {
        self.permissions.lock().receive.contains(&key)
    }

    fn owns_handler(&self) -> bool {
        self.owns_handler.load(Ordering::SeqCst)
    }

    fn set_owns_handler(&self, owns_handler: bool) -> &Self {
        self.owns_handler.store(owns_handler, Ordering::SeqCst);
        self
    }

    fn resolve_message_type(&self, name: &str) -> Result<MessageTypeKey, MissiveError> {
        self.catalog.lookup(name)
    }
}

impl fmt::Debug for MessageHandlerConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let permissions = self.permissions.lock();
        f.debug_struct("MessageHandlerConfiguration")
            .field("handler_id", &self.handler_id)
            .field("handler_name", &self.handler_name)
            .field("send", &permissions.send)
            .field("receive", &permissions.receive)
            .field("owns_handler", &self.owns_handler())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MessageDirections;

    #[derive(Clone, Debug)]
    struct Ping;

    #[derive(Clone, Debug)]
    struct Pong;

    fn configuration() -> MessageHandlerConfiguration {
        MessageHandlerConfiguration::new(HandlerId(1), "test".into(), Arc::default(), true)
    }

    #[test]
    fn starts_without_permissions() {
        let config = configuration();
        assert!(!config.can_send::<Ping>());
        assert!(!config.can_receive::<Ping>());
    }

    #[test]
    fn registration_is_idempotent_and_chainable() {
        let config = configuration();
        config
            .register_for_send::<Ping>()
            .register_for_send::<Ping>()
            .register_for::<Pong>(MessageDirections::Receive);
        assert_eq!(config.send_types(), vec![MessageTypeKey::of::<Ping>()]);
        assert!(config.can_receive::<Pong>());
        assert!(!config.can_send::<Pong>());
    }

    #[test]
    fn named_registration_uses_known_types() {
        let config = configuration();
        config.register_for_receive::<Ping>();
        config.register_for_send_named("Ping").unwrap();
        assert!(config.can_send::<Ping>());
        assert!(matches!(
            config.register_for_send_named(""),
            Err(MissiveError::InvalidArgument(_))
        ));
        assert!(matches!(
            config.register_for_receive_named("Unknown"),
            Err(MissiveError::InvalidArgument(_))
        ));
    }
}
