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
use crate::common::{MessageDirections, MessageTypeKey};
use crate::message::MissiveError;
use crate::traits::MissiveMessage;

/// Declares which message types a handler may send and receive.
///
/// Implemented by [`MessageHandlerConfiguration`](crate::handler::MessageHandlerConfiguration)
/// for a single handler and by
/// [`AggregateHandlerConfiguration`](crate::handler::AggregateHandlerConfiguration)
/// to apply the same declarations to a group of handlers. All registration
/// methods return `&Self` so declarations can be chained:
///
/// ```rust,ignore
/// distributor
///     .register_handler(outlook, true)?
///     .register_for_send::<Box<dyn NewContact>>()
///     .register_for_receive::<Box<dyn NewContact>>();
/// ```
///
/// Registering the same type twice is a no-op.
pub trait HandlerConfiguration: Send + Sync {
    /// Allows the handler to send messages of the given type.
    fn register_for_send_type(&self, key: MessageTypeKey) -> &Self;

    /// Allows the handler to receive messages of the given type.
    fn register_for_receive_type(&self, key: MessageTypeKey) -> &Self;

    fn can_send_type(&self, key: MessageTypeKey) -> bool;

    fn can_receive_type(&self, key: MessageTypeKey) -> bool;

    /// Whether the distributor disposes the handler when it is itself disposed.
    fn owns_handler(&self) -> bool;

    fn set_owns_handler(&self, owns_handler: bool) -> &Self;

    /// Looks a message type up by its full or short type name.
    ///
    /// Only types the distributor has already seen can be found by name: types
    /// declared in its catalog, registered for sending or receiving, subscribed
    /// to, or announced with
    /// [`register_message_type`](crate::common::MessageDistributor::register_message_type).
    fn resolve_message_type(&self, name: &str) -> Result<MessageTypeKey, MissiveError>;

    fn register_for_send<T: MissiveMessage>(&self) -> &Self {
        self.register_for_send_type(MessageTypeKey::of::<T>())
    }

    fn register_for_receive<T: MissiveMessage>(&self) -> &Self {
        self.register_for_receive_type(MessageTypeKey::of::<T>())
    }

    fn register_for<T: MissiveMessage>(&self, directions: MessageDirections) -> &Self {
        self.register_for_type(MessageTypeKey::of::<T>(), directions)
    }

    fn register_for_type(&self, key: MessageTypeKey, directions: MessageDirections) -> &Self {
        if directions.includes_send() {
            self.register_for_send_type(key);
        }
        if directions.includes_receive() {
            self.register_for_receive_type(key);
        }
        self
    }

    /// Registers every type in `keys` for the given directions.
    fn register_for_types<I>(&self, keys: I, directions: MessageDirections) -> &Self
    where
        I: IntoIterator<Item = MessageTypeKey>,
    {
        for key in keys {
            self.register_for_type(key, directions);
        }
        self
    }

    /// Allows sending the type with the given name.
    ///
    /// # Errors
    /// [`MissiveError::InvalidArgument`] when the name is blank or unknown.
    fn register_for_send_named(&self, name: &str) -> Result<&Self, MissiveError> {
        let key = self.resolve_message_type(name)?;
        Ok(self.register_for_send_type(key))
    }

    /// Allows receiving the type with the given name.
    ///
    /// # Errors
    /// [`MissiveError::InvalidArgument`] when the name is blank or unknown.
    fn register_for_receive_named(&self, name: &str) -> Result<&Self, MissiveError> {
        let key = self.resolve_message_type(name)?;
        Ok(self.register_for_receive_type(key))
    }

    fn can_send<T: MissiveMessage>(&self) -> bool {
        self.can_send_type(MessageTypeKey::of::<T>())
    }

    fn can_receive<T: MissiveMessage>(&self) -> bool {
        self.can_receive_type(MessageTypeKey::of::<T>())
    }
}
