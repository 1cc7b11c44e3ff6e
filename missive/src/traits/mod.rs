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

//! Core traits of the distributor: message payloads, handlers, permission
//! configuration and the type-erased view of an envelope.

pub use any_message_context::AnyMessageContext;
pub use handler_configuration::HandlerConfiguration;
pub use message_handler::MessageHandler;
pub use missive_message::MissiveMessage;

mod any_message_context;
mod handler_configuration;
mod message_handler;
mod missive_message;
