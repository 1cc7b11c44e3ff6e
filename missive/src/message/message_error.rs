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

use thiserror::Error;
use uuid::Uuid;

use crate::common::{HandlerId, MessageTypeKey};

/// Errors returned by distributor, context and envelope operations.
#[derive(Debug, Error)]
pub enum MissiveError {
    /// An argument was rejected: a duplicate handler registration, or a blank or unknown type name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The operation is not valid in the object's current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// The named object has been disposed.
    #[error("{0} has been disposed")]
    ObjectDisposed(String),
    #[error("the distributor has already been initialized")]
    AlreadyInitialized,
    /// The envelope with this id was already sent.
    #[error("message {0} has already been sent")]
    AlreadySent(Uuid),
    /// A contract type was requested with no declared instance type.
    #[error("no instance type has been declared for message type `{0}`")]
    UnresolvedMessageType(&'static str),
    /// One or more synchronous subscribers failed and no hook handled it.
    #[error(transparent)]
    Delivery(#[from] AggregateDeliveryError),
    /// One or more owned handlers failed to dispose.
    #[error(transparent)]
    Disposal(#[from] AggregateError),
    /// The background runtime could not be started.
    #[error("failed to start the background dispatcher: {0}")]
    Background(#[source] std::io::Error),
}

/// A failure attributed to one handler.
#[derive(Debug)]
pub struct HandlerFailure {
    pub handler_id: HandlerId,
    pub handler_name: String,
    pub error: anyhow::Error,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {:#}", self.handler_name, self.handler_id, self.error)
    }
}

/// The failures collected while delivering one message.
///
/// Every subscriber is attempted. One entry is recorded per failing subscription.
#[derive(Debug, Error)]
#[error(
    "{} subscriber(s) failed to handle {message_type} message {message_id}",
    .failures.len()
)]
pub struct AggregateDeliveryError {
    pub message_id: Uuid,
    pub message_type: MessageTypeKey,
    pub sender: HandlerId,
    pub failures: Vec<HandlerFailure>,
}

/// Failures collected from several handlers outside of delivery, such as disposal.
#[derive(Debug, Error)]
#[error("{} handler(s) failed: {}", .failures.len(), summarize(.failures))]
pub struct AggregateError {
    pub failures: Vec<HandlerFailure>,
}

fn summarize(failures: &[HandlerFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
