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

//! Shared type aliases and small value types used across the distributor.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use crate::message::MessageContext;
use crate::traits::AnyMessageContext;

/// A typed subscription callback.
///
/// The same `Arc` returned from
/// [`HandlerContext::subscribe`](crate::common::HandlerContext::subscribe)
/// identifies the subscription when unsubscribing.
pub type MessageCallback<T> =
    Arc<dyn Fn(&mut MessageContext<T>) -> anyhow::Result<()> + Send + Sync + 'static>;

/// A subscription callback that sees the type-erased envelope.
pub type AnyMessageCallback =
    Arc<dyn Fn(&mut dyn AnyMessageContext) -> anyhow::Result<()> + Send + Sync + 'static>;

/// Crate-internal: the pre-bound closure a subscription is delivered through.
pub(crate) type Invoker = AnyMessageCallback;

/// Source of timestamps for envelopes and log entries.
pub type Clock = Arc<dyn Fn() -> SystemTime + Send + Sync + 'static>;

/// Identifies a handler registration within one distributor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub(crate) u64);

impl HandlerId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

/// Which permissions a registration grants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MessageDirections {
    Send,
    Receive,
    #[default]
    Both,
}

impl MessageDirections {
    pub fn includes_send(self) -> bool {
        matches!(self, Self::Send | Self::Both)
    }

    pub fn includes_receive(self) -> bool {
        matches!(self, Self::Receive | Self::Both)
    }
}

/// Where a subscription callback runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ThreadOption {
    /// On the sending thread, before `send` returns.
    #[default]
    Current,
    /// On the distributor's background pool. `send` does not wait for it.
    Background,
}

/// How a subscription is delivered.
///
/// A synchronized subscription never runs concurrently with another
/// synchronized subscription for the same message type on the same handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct DeliveryMode {
    pub thread: ThreadOption,
    pub synchronized: bool,
}

impl DeliveryMode {
    pub const CURRENT: Self = Self::new(ThreadOption::Current, false);
    pub const BACKGROUND: Self = Self::new(ThreadOption::Background, false);

    pub const fn new(thread: ThreadOption, synchronized: bool) -> Self {
        Self {
            thread,
            synchronized,
        }
    }

    /// The same mode with synchronization turned on.
    pub const fn synchronized(self) -> Self {
        Self::new(self.thread, true)
    }

    pub fn is_background(&self) -> bool {
        self.thread == ThreadOption::Background
    }
}
