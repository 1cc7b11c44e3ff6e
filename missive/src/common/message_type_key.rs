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
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime identity of a message type.
///
/// Equality and hashing use the [`TypeId`] only. The type name is carried
/// for logs and for lookups by name.
#[derive(Clone, Copy)]
pub struct MessageTypeKey {
    type_id: TypeId,
    name: &'static str,
}

impl MessageTypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The full type name, e.g. `alloc::boxed::Box<dyn app::NewContact>`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The last path segment of the type, e.g. `NewContact` for
    /// `Box<dyn app::NewContact>` or `Ping` for `app::Ping`.
    pub fn short_name(&self) -> &'static str {
        let mut name = self.name;
        for wrapper in ["alloc::boxed::Box<dyn ", "alloc::sync::Arc<dyn "] {
            if let Some(inner) = name.strip_prefix(wrapper) {
                name = inner.strip_suffix('>').unwrap_or(inner);
                break;
            }
        }
        let name = name.split(" + ").next().unwrap_or(name);
        let head = name.split('<').next().unwrap_or(name);
        head.rsplit("::").next().unwrap_or(head)
    }
}

impl PartialEq for MessageTypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for MessageTypeKey {}

impl Hash for MessageTypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for MessageTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageTypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for MessageTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
