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
use std::time::SystemTime;

use uuid::Uuid;

use crate::common::{HandlerId, MessageTypeKey};

/// Severity of a message log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum LogCategory {
    Debug,
    #[default]
    Information,
    Warning,
    Error,
    Critical,
}

/// How urgently a log entry should be looked at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum LogPriority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

/// Whether the logged envelope was being prepared for sending or had been received.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogDirection {
    Outgoing,
    Incoming,
}

/// A log record raised from a message envelope and delivered to the
/// distributor's `on_message_log` hooks.
#[derive(Clone, Debug)]
pub struct MessageLogEntry {
    pub id: Uuid,
    pub time: SystemTime,
    pub category: LogCategory,
    pub priority: LogPriority,
    /// Trimmed and upper-cased. Blank tags become `None`.
    pub tag: Option<String>,
    pub text: String,
    pub message_id: Uuid,
    pub message_type: MessageTypeKey,
    pub handler_id: HandlerId,
    pub handler_name: String,
    pub direction: LogDirection,
}

/// Trims and upper-cases a log tag. Blank tags are dropped.
pub(crate) fn normalize_tag(tag: Option<&str>) -> Option<String> {
    tag.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase)
}
