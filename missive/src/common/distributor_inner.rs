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
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use tracing::{debug, error, trace};

use crate::common::dispatch::panic_message;
use crate::common::{
    BackgroundDispatcher, Clock, DistributorEvents, HandlerContext, HandlerId, MessageCatalog,
    MissiveConfig, ReceiveFailure,
};
use crate::message::{AggregateError, HandlerFailure, MissiveError};
use crate::traits::{HandlerConfiguration, MessageHandler};

/// A registered handler together with the context the distributor built for it.
pub(crate) struct Registration {
    pub(crate) context: HandlerContext,
    pub(crate) handler: Arc<dyn MessageHandler>,
}

/// Crate-internal: the shared state behind a [`MessageDistributor`](crate::common::MessageDistributor).
pub(crate) struct DistributorInner {
    pub(crate) registrations: RwLock<Vec<Registration>>,
    next_handler_id: AtomicU64,
    pub(crate) initialized: AtomicBool,
    disposed: AtomicBool,
    pub(crate) catalog: Arc<MessageCatalog>,
    pub(crate) events: DistributorEvents,
    pub(crate) background: BackgroundDispatcher,
    pub(crate) config: MissiveConfig,
    clock: Clock,
}

impl DistributorInner {
    pub(crate) fn new(config: MissiveConfig, clock: Clock) -> Self {
        Self {
            registrations: RwLock::new(Vec::new()),
            next_handler_id: AtomicU64::new(1),
            initialized: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            catalog: Arc::new(MessageCatalog::default()),
            events: DistributorEvents::default(),
            background: BackgroundDispatcher::new(&config),
            config,
            clock,
        }
    }

    pub(crate) fn now(&self) -> SystemTime {
        (self.clock)()
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub(crate) fn next_handler_id(&self) -> HandlerId {
        HandlerId(self.next_handler_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Contexts of every registration except `sender`, in registration order.
    pub(crate) fn contexts_except(&self, sender: HandlerId) -> Vec<HandlerContext> {
        self.registrations
            .read()
            .iter()
            .filter(|registration| registration.context.handler_id() != sender)
            .map(|registration| registration.context.clone())
            .collect()
    }

    pub(crate) fn report_background_failure(&self, failure: ReceiveFailure) {
        if self.events.raise_receive_failed(&failure) {
            trace!(handler = %failure.handler_id, "background failure handled by a hook");
            return;
        }
        if self.config.behavior.log_unhandled_background_failures {
            error!(
                handler = %failure.handler_id,
                handler_name = %failure.handler_name,
                message_id = %failure.context.id(),
                message_type = %failure.context.message_type(),
                "background delivery failed: {:#}",
                failure.error
            );
        }
    }

    /// Disposes owned handlers and drops every registration. Only the first call does anything.
    pub(crate) fn dispose(&self) -> Result<(), MissiveError> {
        let registrations = {
            let mut registrations = self.registrations.write();
            if self.disposed.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            std::mem::take(&mut *registrations)
        };
        debug!(handlers = registrations.len(), "disposing distributor");

        let mut failures = Vec::new();
        for Registration { context, handler } in registrations {
            context.clear_subscriptions();
            if !context.configuration().owns_handler() || handler.is_disposed() {
                continue;
            }
            trace!(handler = %context.handler_id(), "disposing owned handler");
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.dispose())).unwrap_or_else(
                |payload| {
                    Err(anyhow::anyhow!(
                        "handler panicked while disposing: {}",
                        panic_message(payload.as_ref())
                    ))
                },
            );
            if let Err(error) = outcome {
                failures.push(HandlerFailure {
                    handler_id: context.handler_id(),
                    handler_name: context.handler_name().to_string(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateError { failures }.into())
        }
    }
}

impl Drop for DistributorInner {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            error!("failed to dispose distributor on drop: {}", e);
        }
    }
}
