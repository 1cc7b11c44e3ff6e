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
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use static_assertions::assert_impl_all;
use tracing::{instrument, trace};

use crate::common::subscription_table::{callback_address, SubscriptionTable};
use crate::common::{
    AnyMessageCallback, CallbackHandle, DeliveryMode, DistributorInner, HandlerId, MessageCallback,
    MessageTypeKey,
};
use crate::handler::MessageHandlerConfiguration;
use crate::message::{MessageContext, MissiveError, NewMessage};
use crate::traits::{AnyMessageContext, MessageHandler, MissiveMessage};

pub(crate) struct ContextInner {
    pub(crate) id: HandlerId,
    pub(crate) name: String,
    pub(crate) handler: Weak<dyn MessageHandler>,
    pub(crate) configuration: Arc<MessageHandlerConfiguration>,
    pub(crate) subscriptions: SubscriptionTable,
    pub(crate) distributor: Weak<DistributorInner>,
}

/// A handler's view of its distributor.
///
/// Handed to each handler through [`MessageHandler::update_context`]. Cheap
/// to clone. Through it a handler creates messages and manages its
/// subscriptions.
#[derive(Clone)]
pub struct HandlerContext {
    pub(crate) inner: Arc<ContextInner>,
}

assert_impl_all!(HandlerContext: Send, Sync);

impl HandlerContext {
    pub(crate) fn new(
        id: HandlerId,
        name: String,
        handler: &Arc<dyn MessageHandler>,
        configuration: Arc<MessageHandlerConfiguration>,
        distributor: Weak<DistributorInner>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                id,
                name,
                handler: Arc::downgrade(handler),
                configuration,
                subscriptions: SubscriptionTable::default(),
                distributor,
            }),
        }
    }

    pub fn handler_id(&self) -> HandlerId {
        self.inner.id
    }

    pub fn handler_name(&self) -> &str {
        &self.inner.name
    }

    /// The handler's send and receive permissions.
    pub fn configuration(&self) -> &Arc<MessageHandlerConfiguration> {
        &self.inner.configuration
    }

    /// The live distributor, or `ObjectDisposed` once it is disposed or dropped.
    pub(crate) fn distributor(&self) -> Result<Arc<DistributorInner>, MissiveError> {
        self.inner
            .distributor
            .upgrade()
            .filter(|distributor| !distributor.is_disposed())
            .ok_or_else(|| MissiveError::ObjectDisposed("message distributor".to_string()))
    }

    /// Whether the handler behind this context is gone or disposed.
    pub(crate) fn is_handler_disposed(&self) -> bool {
        self.inner
            .handler
            .upgrade()
            .map_or(true, |handler| handler.is_disposed())
    }

    /// Creates an unsent envelope around `T::default()`, or around the
    /// instance declared for `T` on the distributor.
    ///
    /// # Errors
    /// [`MissiveError::ObjectDisposed`] if the distributor is disposed.
    pub fn create_message<T: MissiveMessage + Default>(&self) -> Result<NewMessage<T>, MissiveError> {
        let distributor = self.distributor()?;
        let factory = distributor.catalog.resolve::<T>(Some(T::default as fn() -> T))?;
        Ok(NewMessage::new(self.clone(), factory(), distributor.now()))
    }

    /// Creates an unsent envelope for a message contract such as `Box<dyn NewContact>`.
    ///
    /// # Errors
    /// - [`MissiveError::UnresolvedMessageType`] if no instance was declared for `T`.
    /// - [`MissiveError::ObjectDisposed`] if the distributor is disposed.
    pub fn create_contract_message<T: MissiveMessage>(&self) -> Result<NewMessage<T>, MissiveError> {
        let distributor = self.distributor()?;
        let factory = distributor.catalog.resolve::<T>(None)?;
        Ok(NewMessage::new(self.clone(), factory(), distributor.now()))
    }

    /// Wraps an existing payload in an unsent envelope.
    ///
    /// # Errors
    /// [`MissiveError::ObjectDisposed`] if the distributor is disposed.
    pub fn create_message_from<T: MissiveMessage>(&self, message: T) -> Result<NewMessage<T>, MissiveError> {
        let distributor = self.distributor()?;
        distributor.catalog.remember(MessageTypeKey::of::<T>());
        Ok(NewMessage::new(self.clone(), message, distributor.now()))
    }

    /// Subscribes to messages of type `T`. The returned callback identifies
    /// the subscription for [`unsubscribe`](Self::unsubscribe).
    ///
    /// Callbacks only run for types the handler is registered to receive.
    pub fn subscribe<T, F>(&self, callback: F, mode: DeliveryMode) -> MessageCallback<T>
    where
        T: MissiveMessage,
        F: Fn(&mut MessageContext<T>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let callback: MessageCallback<T> = Arc::new(callback);
        self.subscribe_callback(callback.clone(), mode);
        callback
    }

    /// Subscribes an existing callback. Subscribing the same callback twice
    /// delivers each message to it twice.
    #[instrument(skip(self, callback), fields(handler = %self.inner.id, message_type = %MessageTypeKey::of::<T>()))]
    pub fn subscribe_callback<T: MissiveMessage>(&self, callback: MessageCallback<T>, mode: DeliveryMode) {
        self.remember(MessageTypeKey::of::<T>());
        self.inner.subscriptions.subscribe(callback, mode);
        trace!(?mode, "subscribed");
    }

    /// Subscribes a callback that only needs the payload.
    pub fn subscribe_payload<T, F>(&self, callback: F, mode: DeliveryMode) -> MessageCallback<T>
    where
        T: MissiveMessage,
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe(move |context: &mut MessageContext<T>| callback(context.message()), mode)
    }

    /// Subscribes to the message type identified by `key` without knowing it statically.
    pub fn subscribe_any<F>(&self, key: MessageTypeKey, callback: F, mode: DeliveryMode) -> AnyMessageCallback
    where
        F: Fn(&mut dyn AnyMessageContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let callback: AnyMessageCallback = Arc::new(callback);
        self.subscribe_any_callback(key, callback.clone(), mode);
        callback
    }

    #[instrument(skip(self, callback), fields(handler = %self.inner.id))]
    pub fn subscribe_any_callback(&self, key: MessageTypeKey, callback: AnyMessageCallback, mode: DeliveryMode) {
        self.remember(key);
        self.inner.subscriptions.subscribe_any(key, callback, mode);
        trace!(?mode, "subscribed");
    }

    /// Removes every subscription of `callback`. Unknown callbacks are ignored.
    /// Returns the number of subscriptions removed.
    pub fn unsubscribe<T: MissiveMessage>(&self, callback: &MessageCallback<T>) -> usize {
        self.inner
            .subscriptions
            .unsubscribe(MessageTypeKey::of::<T>(), callback_address(callback))
    }

    pub fn unsubscribe_any(&self, key: MessageTypeKey, callback: &AnyMessageCallback) -> usize {
        self.inner
            .subscriptions
            .unsubscribe(key, callback_address(callback))
    }

    /// Drops every subscription for `T`. Returns whether there were any.
    pub fn unsubscribe_all<T: MissiveMessage>(&self) -> bool {
        self.unsubscribe_all_type(MessageTypeKey::of::<T>())
    }

    pub fn unsubscribe_all_type(&self, key: MessageTypeKey) -> bool {
        self.inner.subscriptions.unsubscribe_all(key)
    }

    pub fn clear_subscriptions(&self) {
        trace!(handler = %self.inner.id, "clearing subscriptions");
        self.inner.subscriptions.clear();
    }

    /// A snapshot of the subscribed callbacks, keyed by message type.
    pub fn get_subscriptions(&self) -> HashMap<MessageTypeKey, Vec<CallbackHandle>> {
        self.inner.subscriptions.handles()
    }

    /// The message types with at least one subscription.
    pub fn message_types(&self) -> Vec<MessageTypeKey> {
        self.inner.subscriptions.message_types()
    }

    fn remember(&self, key: MessageTypeKey) {
        if let Some(distributor) = self.inner.distributor.upgrade() {
            distributor.catalog.remember(key);
        }
    }
}

impl fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerContext")
            .field("handler_id", &self.inner.id)
            .field("handler_name", &self.inner.name)
            .field("message_types", &self.message_types())
            .finish()
    }
}
