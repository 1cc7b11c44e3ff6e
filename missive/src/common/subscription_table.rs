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
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

use crate::common::{AnyMessageCallback, DeliveryMode, Invoker, MessageCallback, MessageTypeKey};
use crate::traits::{AnyMessageContext, MissiveMessage};

/// Identity of a callback: the address of its `Arc` allocation.
pub(crate) fn callback_address<F: ?Sized>(callback: &Arc<F>) -> usize {
    Arc::as_ptr(callback) as *const () as usize
}

/// A subscribed callback as returned by
/// [`HandlerContext::get_subscriptions`](crate::common::HandlerContext::get_subscriptions).
#[derive(Clone)]
pub struct CallbackHandle {
    key: MessageTypeKey,
    address: usize,
    mode: DeliveryMode,
    callback: Arc<dyn Any + Send + Sync>,
}

impl CallbackHandle {
    pub fn message_type(&self) -> MessageTypeKey {
        self.key
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// The typed callback as subscribed, if this subscription was made for `T`.
    pub fn typed<T: MissiveMessage>(&self) -> Option<MessageCallback<T>> {
        self.callback.downcast_ref::<MessageCallback<T>>().cloned()
    }

    /// The callback of a type-erased subscription, as subscribed.
    pub fn erased(&self) -> Option<AnyMessageCallback> {
        self.callback.downcast_ref::<AnyMessageCallback>().cloned()
    }

    /// Whether this handle refers to `callback`.
    pub fn is<F: ?Sized>(&self, callback: &Arc<F>) -> bool {
        self.address == callback_address(callback)
    }
}

impl fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHandle")
            .field("message_type", &self.key)
            .field("address", &format_args!("{:#x}", self.address))
            .field("mode", &self.mode)
            .finish()
    }
}

#[derive(Clone)]
pub(crate) struct Subscription {
    pub(crate) handle: CallbackHandle,
    pub(crate) invoker: Invoker,
}

impl Subscription {
    pub(crate) fn mode(&self) -> DeliveryMode {
        self.handle.mode
    }
}

/// What a delivery needs from one type entry, copied out of the table.
pub(crate) struct DeliveryPlan {
    pub(crate) subscriptions: Vec<Subscription>,
    pub(crate) gate: Arc<ReentrantMutex<()>>,
}

#[derive(Default)]
struct Entries {
    subscriptions: HashMap<MessageTypeKey, Vec<Subscription>>,
    gates: HashMap<MessageTypeKey, Arc<ReentrantMutex<()>>>,
}

/// Per-handler map from message type to ordered subscriptions.
///
/// A type's subscription list is created on first subscribe and removed with
/// its last subscription. Its synchronization gate outlives the list, so a
/// synchronized callback still running after an unsubscribe excludes the
/// callbacks subscribed after it. Delivery works on a copy of the list, so
/// callbacks may subscribe and unsubscribe freely while a delivery is in
/// flight.
#[derive(Default)]
pub(crate) struct SubscriptionTable {
    entries: Mutex<Entries>,
}

impl SubscriptionTable {
    pub(crate) fn subscribe<T: MissiveMessage>(&self, callback: MessageCallback<T>, mode: DeliveryMode) {
        let key = MessageTypeKey::of::<T>();
        let typed = callback.clone();
        let invoker: Invoker = Arc::new(move |context: &mut dyn AnyMessageContext| {
            match context.as_any_mut().downcast_mut() {
                Some(context) => typed(context),
                None => Err(anyhow::anyhow!(
                    "message context is not a {}",
                    std::any::type_name::<T>()
                )),
            }
        });
        let handle = CallbackHandle {
            key,
            address: callback_address(&callback),
            mode,
            callback: Arc::new(callback),
        };
        self.insert(key, Subscription { handle, invoker });
    }

    pub(crate) fn subscribe_any(&self, key: MessageTypeKey, callback: AnyMessageCallback, mode: DeliveryMode) {
        let handle = CallbackHandle {
            key,
            address: callback_address(&callback),
            mode,
            callback: Arc::new(callback.clone()),
        };
        self.insert(
            key,
            Subscription {
                handle,
                invoker: callback,
            },
        );
    }

    fn insert(&self, key: MessageTypeKey, subscription: Subscription) {
        let mut entries = self.entries.lock();
        entries
            .gates
            .entry(key)
            .or_insert_with(|| Arc::new(ReentrantMutex::new(())));
        entries.subscriptions.entry(key).or_default().push(subscription);
    }

    /// Removes every subscription of `key` whose callback is `callback`.
    /// Returns how many were removed.
    pub(crate) fn unsubscribe(&self, key: MessageTypeKey, callback: usize) -> usize {
        let mut entries = self.entries.lock();
        let Some(subscriptions) = entries.subscriptions.get_mut(&key) else {
            return 0;
        };
        let before = subscriptions.len();
        subscriptions.retain(|s| s.handle.address != callback);
        let removed = before - subscriptions.len();
        if subscriptions.is_empty() {
            entries.subscriptions.remove(&key);
        }
        removed
    }

    pub(crate) fn unsubscribe_all(&self, key: MessageTypeKey) -> bool {
        self.entries.lock().subscriptions.remove(&key).is_some()
    }

    pub(crate) fn clear(&self) {
        self.entries.lock().subscriptions.clear();
    }

    pub(crate) fn snapshot(&self, key: MessageTypeKey) -> Option<DeliveryPlan> {
        let entries = self.entries.lock();
        let subscriptions = entries.subscriptions.get(&key)?.clone();
        let gate = entries.gates.get(&key)?.clone();
        Some(DeliveryPlan { subscriptions, gate })
    }

    pub(crate) fn handles(&self) -> HashMap<MessageTypeKey, Vec<CallbackHandle>> {
        self.entries
            .lock()
            .subscriptions
            .iter()
            .map(|(key, subscriptions)| {
                let handles = subscriptions.iter().map(|s| s.handle.clone()).collect();
                (*key, handles)
            })
            .collect()
    }

    pub(crate) fn message_types(&self) -> Vec<MessageTypeKey> {
        self.entries.lock().subscriptions.keys().copied().collect()
    }
}
