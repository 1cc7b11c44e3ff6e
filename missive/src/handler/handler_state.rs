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
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use crate::common::HandlerContext;
use crate::message::MissiveError;

/// Bookkeeping most handlers need: a disposed flag and the context slot.
///
/// Embed it in a handler type and forward [`MessageHandler`](crate::traits::MessageHandler)
/// calls to it.
#[derive(Default)]
pub struct HandlerState {
    disposed: AtomicBool,
    context: RwLock<Option<HandlerContext>>,
}

impl HandlerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Stores the context handed over by the distributor, replacing any previous one.
    pub fn set_context(&self, context: HandlerContext) {
        trace!(handler = %context.handler_id(), "context updated");
        *self.context.write() = Some(context);
    }

    pub fn has_context(&self) -> bool {
        self.context.read().is_some()
    }

    /// The current context.
    ///
    /// # Errors
    /// - [`MissiveError::ObjectDisposed`] once the handler is disposed.
    /// - [`MissiveError::InvalidOperation`] before the distributor supplied a context.
    pub fn context(&self) -> Result<HandlerContext, MissiveError> {
        self.ensure_not_disposed()?;
        self.context.read().clone().ok_or_else(|| {
            MissiveError::InvalidOperation("handler has no context; initialize the distributor first".into())
        })
    }

    pub fn ensure_not_disposed(&self) -> Result<(), MissiveError> {
        if self.is_disposed() {
            let name = self
                .context
                .read()
                .as_ref()
                .map_or_else(|| "handler".to_string(), |c| c.handler_name().to_string());
            return Err(MissiveError::ObjectDisposed(name));
        }
        Ok(())
    }

    /// Marks the handler disposed and drops its subscriptions.
    /// Returns `false` if it was already disposed.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return false;
        }
        if let Some(context) = self.context.read().as_ref() {
            context.clear_subscriptions();
        }
        true
    }
}

impl fmt::Debug for HandlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerState")
            .field("disposed", &self.is_disposed())
            .field("context", &self.context.read().as_ref().map(HandlerContext::handler_id))
            .finish()
    }
}
