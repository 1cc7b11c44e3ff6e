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
use std::fmt;
use std::ops::{Deref, DerefMut};

use static_assertions::assert_impl_all;
use tracing::{instrument, trace};

use crate::common::{dispatch, HandlerContext, MessageTypeKey, SendFailure};
use crate::message::{AggregateDeliveryError, MessageContext, MissiveError};
use crate::traits::{AnyMessageContext, HandlerConfiguration, MissiveMessage};

/// An outgoing message envelope.
///
/// Created through [`HandlerContext::create_message`] and friends, filled in
/// through [`DerefMut`] to the underlying [`MessageContext`], then delivered
/// with [`send`](Self::send).
///
/// ```rust,ignore
/// let mut message = context.create_contract_message::<Box<dyn NewContact>>()?;
/// message.message_mut().set_name("Ada");
/// message.send()?;
/// ```
pub struct NewMessage<T: MissiveMessage> {
    context: MessageContext<T>,
}

assert_impl_all!(NewMessage<String>: Send, Sync);

impl<T: MissiveMessage> NewMessage<T> {
    pub(crate) fn new(owner: HandlerContext, message: T, creation_time: std::time::SystemTime) -> Self {
        Self {
            context: MessageContext::outgoing(owner, message, creation_time),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.context.send_time.is_some()
    }

    /// Delivers the message to every other registered handler that may receive it.
    ///
    /// Subscriptions running on the current thread finish before this returns.
    /// Background subscriptions are only scheduled. Every subscriber is
    /// attempted even when some fail.
    ///
    /// Sending a type the owning handler is not registered to send does
    /// nothing and leaves the envelope unsent.
    ///
    /// # Errors
    /// - [`MissiveError::AlreadySent`] if the envelope was sent before.
    /// - [`MissiveError::ObjectDisposed`] if the distributor is disposed or gone.
    /// - [`MissiveError::Delivery`] if subscribers failed and no `on_send_failed`
    ///   hook handled the failure. The envelope counts as sent.
    #[instrument(skip(self), fields(message_id = %self.context.id, message_type = %MessageTypeKey::of::<T>()))]
    pub fn send(&mut self) -> Result<(), MissiveError> {
        if self.is_sent() {
            return Err(MissiveError::AlreadySent(self.context.id));
        }
        let distributor = self.context.owner.distributor()?;
        let key = MessageTypeKey::of::<T>();
        if !self.context.owner.configuration().can_send_type(key) {
            trace!(sender = %self.context.sender, "sender is not registered to send this type, skipping");
            return Ok(());
        }

        self.context.send_time = Some(distributor.now());
        let failures = dispatch::fan_out(&distributor, &self.context);
        if failures.is_empty() {
            return Ok(());
        }

        let failure = SendFailure {
            handler_id: self.context.sender,
            handler_name: self.context.owner.handler_name().to_string(),
            context: self.context.clone_untagged(),
            error: AggregateDeliveryError {
                message_id: self.context.id,
                message_type: key,
                sender: self.context.sender,
                failures,
            },
        };
        if distributor.events.raise_send_failed(&failure) {
            trace!("delivery failure handled by a hook");
            Ok(())
        } else {
            Err(MissiveError::Delivery(failure.error))
        }
    }
}

impl<T: MissiveMessage> Deref for NewMessage<T> {
    type Target = MessageContext<T>;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl<T: MissiveMessage> DerefMut for NewMessage<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.context
    }
}

impl<T: MissiveMessage> fmt::Debug for NewMessage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NewMessage").field(&self.context).finish()
    }
}
