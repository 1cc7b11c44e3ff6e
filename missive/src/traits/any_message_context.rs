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
use std::any::Any;
use std::time::SystemTime;

use uuid::Uuid;

use crate::common::{HandlerId, MessageTypeKey};
use crate::traits::MissiveMessage;

/// A type-erased view of a [`MessageContext`](crate::message::MessageContext).
///
/// Subscriptions registered through
/// [`HandlerContext::subscribe_any`](crate::common::HandlerContext::subscribe_any)
/// receive this view, and failure reports carry a boxed copy of it.
/// Downcast with [`as_any`](Self::as_any) to reach the typed context.
pub trait AnyMessageContext: Send + Sync {
    /// Unique identifier of the message.
    fn id(&self) -> Uuid;
    /// When the envelope was created.
    fn creation_time(&self) -> SystemTime;
    /// When the envelope was sent, if it has been.
    fn send_time(&self) -> Option<SystemTime>;
    /// The type the message was sent as.
    fn message_type(&self) -> MessageTypeKey;
    /// The handler that sent, or is about to send, the message.
    fn sender(&self) -> HandlerId;
    /// The payload.
    fn message(&self) -> &dyn MissiveMessage;
    /// The recipient-local tag, if one was attached.
    fn tag_any(&self) -> Option<&(dyn Any + Send + Sync)>;
    /// Attaches or clears a recipient-local tag.
    fn set_tag_any(&mut self, tag: Option<Box<dyn Any + Send + Sync>>);
    /// Emits a log entry through the distributor's message log hooks.
    fn log(
        &self,
        text: &str,
        category: crate::message::LogCategory,
        priority: crate::message::LogPriority,
        tag: Option<&str>,
    ) -> bool;
    /// Copies the context. The copy carries no tag.
    fn clone_untagged(&self) -> Box<dyn AnyMessageContext>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl std::fmt::Debug for dyn AnyMessageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyMessageContext")
            .field("id", &self.id())
            .field("message_type", &self.message_type())
            .field("sender", &self.sender())
            .field("send_time", &self.send_time())
            .field("message", &self.message())
            .finish()
    }
}
