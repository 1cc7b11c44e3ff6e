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
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::HandlerId;
use crate::message::{AggregateDeliveryError, MessageLogEntry};
use crate::traits::AnyMessageContext;

type MessageLogHook = Arc<dyn Fn(&MessageLogEntry) + Send + Sync + 'static>;
type SendFailedHook = Arc<dyn Fn(&SendFailure) -> bool + Send + Sync + 'static>;
type ReceiveFailedHook = Arc<dyn Fn(&ReceiveFailure) -> bool + Send + Sync + 'static>;

/// Raised when synchronous delivery of a sent message had failures.
#[derive(Debug)]
pub struct SendFailure {
    /// The sending handler.
    pub handler_id: HandlerId,
    pub handler_name: String,
    /// A copy of the sent envelope.
    pub context: Box<dyn AnyMessageContext>,
    pub error: AggregateDeliveryError,
}

/// Raised when a background subscription failed.
#[derive(Debug)]
pub struct ReceiveFailure {
    /// The receiving handler.
    pub handler_id: HandlerId,
    pub handler_name: String,
    /// The recipient's copy of the envelope.
    pub context: Box<dyn AnyMessageContext>,
    pub error: anyhow::Error,
}

/// Hooks a distributor raises for message logging and delivery failures.
///
/// Failure hooks return `true` to mark the failure as handled. Every hook is
/// called; the failure counts as handled if any of them returned `true`.
#[derive(Default)]
pub struct DistributorEvents {
    message_log: RwLock<Vec<MessageLogHook>>,
    send_failed: RwLock<Vec<SendFailedHook>>,
    receive_failed: RwLock<Vec<ReceiveFailedHook>>,
    unhandled_background_failures: AtomicUsize,
}

impl DistributorEvents {
    pub fn on_message_log<F>(&self, hook: F) -> &Self
    where
        F: Fn(&MessageLogEntry) + Send + Sync + 'static,
    {
        self.message_log.write().push(Arc::new(hook));
        self
    }

    /// Called when `send` collected failures from subscribers on the sending thread.
    /// Returning `true` keeps `send` from returning the failure as an error.
    pub fn on_send_failed<F>(&self, hook: F) -> &Self
    where
        F: Fn(&SendFailure) -> bool + Send + Sync + 'static,
    {
        self.send_failed.write().push(Arc::new(hook));
        self
    }

    /// Called when a background subscription failed.
    pub fn on_receive_failed<F>(&self, hook: F) -> &Self
    where
        F: Fn(&ReceiveFailure) -> bool + Send + Sync + 'static,
    {
        self.receive_failed.write().push(Arc::new(hook));
        self
    }

    /// Background failures that no `on_receive_failed` hook handled.
    pub fn unhandled_background_failures(&self) -> usize {
        self.unhandled_background_failures.load(Ordering::SeqCst)
    }

    pub(crate) fn raise_message_log(&self, entry: &MessageLogEntry) -> bool {
        let hooks = self.message_log.read().clone();
        hooks.iter().for_each(|hook| hook(entry));
        !hooks.is_empty()
    }

    pub(crate) fn raise_send_failed(&self, failure: &SendFailure) -> bool {
        let hooks = self.send_failed.read().clone();
        hooks.iter().fold(false, |handled, hook| hook(failure) || handled)
    }

    pub(crate) fn raise_receive_failed(&self, failure: &ReceiveFailure) -> bool {
        let hooks = self.receive_failed.read().clone();
        let handled = hooks.iter().fold(false, |handled, hook| hook(failure) || handled);
        if !handled {
            self.unhandled_background_failures.fetch_add(1, Ordering::SeqCst);
        }
        handled
    }
}

impl fmt::Debug for DistributorEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributorEvents")
            .field("message_log", &self.message_log.read().len())
            .field("send_failed", &self.send_failed.read().len())
            .field("receive_failed", &self.receive_failed.read().len())
            .finish()
    }
}
