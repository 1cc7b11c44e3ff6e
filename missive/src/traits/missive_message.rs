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
use std::fmt::Debug;

use dyn_clone::DynClone;

/// A marker trait for types that can travel through a [`MessageDistributor`](crate::common::MessageDistributor).
///
/// Every recipient of a sent message gets its own deep copy of the payload, so
/// payloads must be cloneable, even behind a trait object. The blanket
/// implementation covers any `Clone + Debug + Send + Sync + 'static` type,
/// which is what [`missive_message`](missive_macro::missive_message) derives.
///
/// Message contracts are expressed as boxed trait objects. A contract trait
/// that extends [`DynClone`] and is registered with
/// `dyn_clone::clone_trait_object!` makes `Box<dyn Contract>` a message type
/// in its own right:
///
/// ```rust,ignore
/// pub trait NewContact: DynClone + Debug + Send + Sync {
///     fn name(&self) -> &str;
/// }
/// dyn_clone::clone_trait_object!(NewContact);
///
/// // `Box<dyn NewContact>` now implements `MissiveMessage`.
/// ```
pub trait MissiveMessage: DynClone + Any + Send + Sync + Debug {
    /// Returns the payload as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the payload as mutable [`Any`] for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

dyn_clone::clone_trait_object!(MissiveMessage);

impl<T> MissiveMessage for T
where
    T: Any + Send + Sync + Debug + DynClone + 'static,
{
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
