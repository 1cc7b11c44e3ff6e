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
use std::fmt;
use std::time::SystemTime;

use static_assertions::assert_impl_all;
use tracing::trace;
use uuid::Uuid;

use crate::common::{HandlerContext, HandlerId, MessageTypeKey};
use crate::message::log_entry::normalize_tag;
use crate::message::{LogCategory, LogDirection, LogPriority, MessageLogEntry};
use crate::traits::{AnyMessageContext, MissiveMessage};

/// A message envelope as seen by a recipient.
///
/// Each recipient handler gets its own `MessageContext`: the id, timestamps
/// and type match the sent envelope, the payload is a fresh clone and the tag
/// starts out empty. Subscriptions of the same handler that run on the
/// sending thread share that handler's copy, so a tag set by one is visible
/// to the next.
pub struct MessageContext<T: MissiveMessage> {
    pub(crate) id: Uuid,
    pub(crate) creation_time: SystemTime,
    pub(crate) send_time: Option<SystemTime>,
    pub(crate) message: T,
    pub(crate) tag: Option<Box<dyn Any + Send + Sync>>,
    pub(crate) sender: HandlerId,
    pub(crate) owner: HandlerContext,
    pub(crate) direction: LogDirection,
}

assert_impl_all!(MessageContext<u32>: Send, Sync);

impl<T: MissiveMessage> MessageContext<T> {
    pub(crate) fn outgoing(owner: HandlerContext, message: T, creation_time: SystemTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            creation_time,
            send_time: None,
            message,
            tag: None,
            sender: owner.handler_id(),
            owner,
            direction: LogDirection::Outgoing,
        }
    }

    /// The copy handed to one recipient.
    pub(crate) fn clone_for_recipient(&self, owner: HandlerContext, send_time: SystemTime) -> Self {
        Self {
            id: self.id,
            creation_time: self.creation_time,
            send_time: Some(send_time),
            message: dyn_clone::clone(&self.message),
            tag: None,
            sender: self.sender,
            owner,
            direction: LogDirection::Incoming,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn creation_time(&self) -> SystemTime {
        self.creation_time
    }

    /// When the message was sent. Always set on received copies.
    pub fn send_time(&self) -> Option<SystemTime> {
        self.send_time
    }

    pub fn message_type(&self) -> MessageTypeKey {
        MessageTypeKey::of::<T>()
    }

    pub fn message(&self) -> &T {
        &self.message
    }

    pub fn message_mut(&mut self) -> &mut T {
        &mut self.message
    }

    pub fn into_message(self) -> T {
        self.message
    }

    /// The handler that sent the message.
    pub fn sender(&self) -> HandlerId {
        self.sender
    }

    /// The context of the handler holding this envelope.
    pub fn handler(&self) -> &HandlerContext {
        &self.owner
    }

    /// Returns the tag if one is attached and it has type `V`.
    pub fn tag<V: Any>(&self) -> Option<&V> {
        self.tag.as_ref().and_then(|tag| tag.downcast_ref::<V>())
    }

    pub fn set_tag<V: Any + Send + Sync>(&mut self, tag: V) {
        self.tag = Some(Box::new(tag));
    }

    pub fn take_tag(&mut self) -> Option<Box<dyn Any + Send + Sync>> {
        self.tag.take()
    }

    pub fn has_tag(&self) -> bool {
        self.tag.is_some()
    }

    /// Raises a [`MessageLogEntry`] for this envelope through the
    /// distributor's `on_message_log` hooks.
    ///
    /// Returns `true` if at least one hook received the entry. The tag is
    /// trimmed and upper-cased; a blank tag is dropped.
    pub fn log(
        &self,
        text: impl Into<String>,
        category: LogCategory,
        priority: LogPriority,
        tag: Option<&str>,
    ) -> bool {
        let Ok(distributor) = self.owner.distributor() else {
            trace!(message_id = %self.id, "log entry dropped, distributor is gone");
            return false;
        };
        let entry = MessageLogEntry {
            id: Uuid::new_v4(),
            time: distributor.now(),
            category,
            priority,
            tag: normalize_tag(tag),
            text: text.into(),
            message_id: self.id,
            message_type: self.message_type(),
            handler_id: self.owner.handler_id(),
            handler_name: self.owner.handler_name().to_string(),
            direction: self.direction,
        };
        distributor.events.raise_message_log(&entry)
    }
}

impl<T: MissiveMessage> fmt::Debug for MessageContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageContext")
            .field("id", &self.id)
            .field("creation_time", &self.creation_time)
            .field("send_time", &self.send_time)
            .field("message", &self.message)
            .field("has_tag", &self.tag.is_some())
            .field("sender", &self.sender)
            .field("owner", &self.owner.handler_id())
            .finish()
    }
}

impl<T: MissiveMessage> AnyMessageContext for MessageContext<T> {
    fn id(&self) -> Uuid {
        self.id
    }

    fn creation_time(&self) -> SystemTime {
        self.creation_time
    }

    fn send_time(&self) -> Option<SystemTime> {
        self.send_time
    }

    fn message_type(&self) -> MessageTypeKey {
        MessageTypeKey::of::<T>()
    }

    fn sender(&self) -> HandlerId {
        self.sender
    }

    fn message(&self) -> &dyn MissiveMessage {
        &self.message
    }

    fn tag_any(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.tag.as_deref()
    }

    fn set_tag_any(&mut self, tag: Option<Box<dyn Any + Send + Sync>>) {
        self.tag = tag;
    }

    fn log(&self, text: &str, category: LogCategory, priority: LogPriority, tag: Option<&str>) -> bool {
        MessageContext::log(self, text, category, priority, tag)
    }

    fn clone_untagged(&self) -> Box<dyn AnyMessageContext> {
        Box::new(Self {
            id: self.id,
            creation_time: self.creation_time,
            send_time: self.send_time,
            message: dyn_clone::clone(&self.message),
            tag: None,
            sender: self.sender,
            owner: self.owner.clone(),
            direction: self.direction,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
