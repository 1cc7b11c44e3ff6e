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

#![forbid(unsafe_code)]

//! # Missive
//!
//! An in-process publish/subscribe message distributor. Independently
//! written components exchange typed messages without holding references to
//! one another.
//!
//! ## Key Concepts
//!
//! - **Distributor (`MessageDistributor`)**: keeps the handler registry,
//!   initializes handlers and fans sent messages out.
//! - **Handlers (`MessageHandler`)**: participants. Each one declares which
//!   message types it may send and receive through its
//!   `MessageHandlerConfiguration`.
//! - **Contexts (`HandlerContext`)**: a handler's access to the distributor,
//!   used to subscribe and to create messages.
//! - **Envelopes (`NewMessage`, `MessageContext`)**: a payload plus identity,
//!   timestamps and a recipient-local tag. Every recipient receives its own copy.
//! - **Delivery modes (`DeliveryMode`)**: subscriptions run on the sending
//!   thread or on a background pool, optionally synchronized per type.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use missive::prelude::*;
//!
//! #[missive_message]
//! #[derive(Default)]
//! struct Greeting {
//!     text: String,
//! }
//!
//! let distributor = MessageDistributor::new();
//! let sender = DelegateHandler::new("sender");
//! let receiver = DelegateHandler::new("receiver");
//! distributor.register_handler(sender.clone(), true)?.register_for_send::<Greeting>();
//! distributor.register_handler(receiver.clone(), true)?.register_for_receive::<Greeting>();
//! distributor.initialize()?;
//!
//! receiver.subscribe_payload(|greeting: &Greeting| {
//!     println!("{}", greeting.text);
//!     Ok(())
//! }, DeliveryMode::CURRENT)?;
//!
//! let mut greeting = sender.create_message::<Greeting>()?;
//! greeting.message_mut().text = "hello".into();
//! greeting.send()?;
//! ```

/// The distributor, contexts, configuration and shared types.
pub(crate) mod common;

/// Handler building blocks and permission configurations.
pub(crate) mod handler;

/// Envelopes, log entries and errors.
pub(crate) mod message;

/// Core traits.
pub(crate) mod traits;

/// A prelude module for conveniently importing the most commonly used items.
///
/// ## Macros (from `missive-macro`)
/// *   [`missive_macro::missive_message`]: Attribute macro for message payloads.
/// *   [`missive_macro::missive_handler`]: Attribute macro for handler types.
///
/// ## Core Types
/// *   [`crate::common::MessageDistributor`]: The distributor.
/// *   [`crate::common::HandlerContext`]: A handler's access to its distributor.
/// *   [`crate::common::DeliveryMode`]: Where and how a subscription runs.
/// *   [`crate::message::NewMessage`] and [`crate::message::MessageContext`]: Envelopes.
/// *   [`crate::handler::HandlerState`] and [`crate::handler::DelegateHandler`]: Handler building blocks.
/// *   [`crate::message::MissiveError`]: The error type.
pub mod prelude {
    pub use missive_macro::*;

    pub use crate::common::config::{BackgroundConfig, BehaviorConfig, DefaultsConfig};
    pub use crate::common::{
        AnyMessageCallback, CallbackHandle, Clock, DeliveryMode, DistributorEvents, HandlerContext,
        HandlerId, InstanceFactory, MessageCallback, MessageDirections, MessageDistributor,
        MessageTypeKey, MissiveConfig, ReceiveFailure, SendFailure, ThreadOption, CONFIG,
    };
    pub use crate::handler::{
        AggregateHandlerConfiguration, DelegateHandler, HandlerState, MessageHandlerConfiguration,
    };
    pub use crate::message::{
        AggregateDeliveryError, AggregateError, HandlerFailure, LogCategory, LogDirection,
        LogPriority, MessageContext, MessageLogEntry, MissiveError, NewMessage,
    };
    pub use crate::traits::{
        AnyMessageContext, HandlerConfiguration, MessageHandler, MissiveMessage,
    };
}
