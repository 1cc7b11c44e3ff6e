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

//! Fan-out of a sent envelope to every eligible recipient.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{error, trace};

use crate::common::subscription_table::Subscription;
use crate::common::{DistributorInner, HandlerContext, MessageTypeKey, ReceiveFailure, ThreadOption};
use crate::message::{HandlerFailure, MessageContext};
use crate::traits::{AnyMessageContext, HandlerConfiguration, MissiveMessage};

/// Delivers `sent` to every other registered handler allowed to receive it.
///
/// Recipients are visited in registration order and each recipient's
/// subscriptions in subscription order. Returns the failures of
/// subscriptions that ran on this thread, plus background jobs that could
/// not be scheduled.
pub(crate) fn fan_out<T: MissiveMessage>(
    distributor: &Arc<DistributorInner>,
    sent: &MessageContext<T>,
) -> Vec<HandlerFailure> {
    let key = MessageTypeKey::of::<T>();
    let send_time = sent.send_time.unwrap_or_else(|| distributor.now());
    let mut failures = Vec::new();

    for recipient in distributor.contexts_except(sent.sender) {
        if recipient.is_handler_disposed() {
            trace!(recipient = %recipient.handler_id(), "skipping disposed handler");
            continue;
        }
        if !recipient.configuration().can_receive_type(key) {
            continue;
        }
        let Some(plan) = recipient.inner.subscriptions.snapshot(key) else {
            continue;
        };

        trace!(
            recipient = %recipient.handler_id(),
            subscriptions = plan.subscriptions.len(),
            "delivering"
        );
        let mut copy = sent.clone_for_recipient(recipient.clone(), send_time);
        for subscription in plan.subscriptions {
            match subscription.mode().thread {
                ThreadOption::Current => {
                    if let Err(error) = deliver(&subscription, &plan.gate, &mut copy) {
                        failures.push(failure(&recipient, error));
                    }
                }
                ThreadOption::Background => {
                    let job_context: Box<dyn AnyMessageContext> =
                        Box::new(sent.clone_for_recipient(recipient.clone(), send_time));
                    let job = BackgroundJob {
                        distributor: Arc::downgrade(distributor),
                        recipient: recipient.clone(),
                        subscription,
                        gate: plan.gate.clone(),
                        context: job_context,
                    };
                    if let Err(error) = distributor.background.spawn(move || job.run()) {
                        failures.push(failure(&recipient, error.into()));
                    }
                }
            }
        }
    }
    failures
}

struct BackgroundJob {
    distributor: std::sync::Weak<DistributorInner>,
    recipient: HandlerContext,
    subscription: Subscription,
    gate: Arc<ReentrantMutex<()>>,
    context: Box<dyn AnyMessageContext>,
}

impl BackgroundJob {
    fn run(mut self) {
        let result = deliver(&self.subscription, &self.gate, self.context.as_mut());
        let Err(error) = result else {
            return;
        };
        let failure = ReceiveFailure {
            handler_id: self.recipient.handler_id(),
            handler_name: self.recipient.handler_name().to_string(),
            context: self.context,
            error,
        };
        match self.distributor.upgrade() {
            Some(distributor) => distributor.report_background_failure(failure),
            None => error!(
                handler = %failure.handler_id,
                message_id = %failure.context.id(),
                "background delivery failed after the distributor was dropped: {:#}",
                failure.error
            ),
        }
    }
}

/// Runs one subscription, holding the type gate if it is synchronized.
/// A panic in the callback becomes an error.
fn deliver(
    subscription: &Subscription,
    gate: &ReentrantMutex<()>,
    context: &mut dyn AnyMessageContext,
) -> anyhow::Result<()> {
    let _guard = subscription.mode().synchronized.then(|| gate.lock());
    match panic::catch_unwind(AssertUnwindSafe(|| (subscription.invoker)(context))) {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!(
            "subscriber panicked: {}",
            panic_message(payload.as_ref())
        )),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn failure(recipient: &HandlerContext, error: anyhow::Error) -> HandlerFailure {
    HandlerFailure {
        handler_id: recipient.handler_id(),
        handler_name: recipient.handler_name().to_string(),
        error,
    }
}
