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
use std::sync::Arc;

use crate::common::{DeliveryMode, HandlerContext, MessageCallback};
use crate::handler::HandlerState;
use crate::message::{MessageContext, MissiveError, NewMessage};
use crate::traits::{MessageHandler, MissiveMessage};

/// A ready-made handler that exposes its context operations directly.
///
/// Useful when a component only needs to subscribe and send, without a
/// handler type of its own.
///
/// ```rust,ignore
/// let audit = DelegateHandler::new("audit");
/// distributor.register_handler(audit.clone(), true)?
///     .register_for_receive::<Box<dyn NewContact>>();
/// distributor.initialize()?;
///
/// audit.subscribe_payload(|contact: &Box<dyn NewContact>| {
///     tracing::info!(name = contact.name(), "contact created");
///     Ok(())
/// }, DeliveryMode::BACKGROUND)?;
/// ```
#[derive(Debug)]
pub struct DelegateHandler {
    name: String,
    state: HandlerState,
}

impl DelegateHandler {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            state: HandlerState::new(),
        })
    }

    pub fn state(&self) -> &HandlerState {
        &self.state
    }

    pub fn context(&self) -> Result<HandlerContext, MissiveError> {
        self.state.context()
    }

    pub fn create_message<T: MissiveMessage + Default>(&self) -> Result<NewMessage<T>, MissiveError> {
        self.context()?.create_message()
    }

    pub fn create_contract_message<T: MissiveMessage>(&self) -> Result<NewMessage<T>, MissiveError> {
        self.context()?.create_contract_message()
    }

    pub fn create_message_from<T: MissiveMessage>(&self, message: T) -> Result<NewMessage<T>, MissiveError> {
        self.context()?.create_message_from(message)
    }

    pub fn subscribe<T, F>(&self, callback: F, mode: DeliveryMode) -> Result<MessageCallback<T>, MissiveError>
    where
        T: MissiveMessage,
        F: Fn(&mut MessageContext<T>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Ok(self.context()?.subscribe(callback, mode))
    }

    pub fn subscribe_payload<T, F>(&self, callback: F, mode: DeliveryMode) -> Result<MessageCallback<T>, MissiveError>
    where
        T: MissiveMessage,
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Ok(self.context()?.subscribe_payload(callback, mode))
    }

    pub fn unsubscribe<T: MissiveMessage>(&self, callback: &MessageCallback<T>) -> Result<usize, MissiveError> {
        Ok(self.context()?.unsubscribe(callback))
    }

    pub fn unsubscribe_all<T: MissiveMessage>(&self) -> Result<bool, MissiveError> {
        Ok(self.context()?.unsubscribe_all::<T>())
    }

    pub fn clear_subscriptions(&self) -> Result<(), MissiveError> {
        self.context()?.clear_subscriptions();
        Ok(())
    }
}

impl MessageHandler for DelegateHandler {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn is_disposed(&self) -> bool {
        self.state.is_disposed()
    }

    fn update_context(&self, context: HandlerContext) {
        self.state.set_context(context);
    }

    fn dispose(&self) -> anyhow::Result<()> {
        self.state.dispose();
        Ok(())
    }
}
