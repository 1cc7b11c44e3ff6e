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

//! The distributor, handler contexts and their supporting machinery.

pub use config::{MissiveConfig, CONFIG};
pub use distributor::MessageDistributor;
pub use events::{DistributorEvents, ReceiveFailure, SendFailure};
pub use handler_context::HandlerContext;
pub use catalog::InstanceFactory;
pub use message_type_key::MessageTypeKey;
pub use subscription_table::CallbackHandle;
pub use types::*;

pub(crate) use background::BackgroundDispatcher;
pub(crate) use catalog::MessageCatalog;
pub(crate) use distributor_inner::{DistributorInner, Registration};

mod background;
mod catalog;
/// Configuration loaded from XDG-compliant locations.
pub mod config;
pub(crate) mod dispatch;
mod distributor;
mod distributor_inner;
mod events;
mod handler_context;
mod message_type_key;
pub(crate) mod subscription_table;
mod types;
