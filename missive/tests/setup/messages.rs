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
#![allow(unused)]

use std::fmt::Debug;

use dyn_clone::DynClone;
use missive::prelude::*;

/// A message contract: handlers only know the trait, the distributor
/// decides which concrete type backs it.
pub trait NewContact: DynClone + Debug + Send + Sync {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
    fn email(&self) -> &str;
    fn set_email(&mut self, email: String);
}

dyn_clone::clone_trait_object!(NewContact);

pub type NewContactMessage = Box<dyn NewContact>;

#[missive_message]
#[derive(Default)]
pub struct Contact {
    pub name: String,
    pub email: String,
}

impl NewContact for Contact {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn set_email(&mut self, email: String) {
        self.email = email;
    }
}

impl From<Contact> for Box<dyn NewContact> {
    fn from(contact: Contact) -> Self {
        Box::new(contact)
    }
}

#[missive_message]
#[derive(Default, PartialEq)]
pub struct Ping {
    pub sequence: u32,
}

#[missive_message]
#[derive(Default)]
pub struct Pong;

#[missive_message]
#[derive(Default)]
pub struct Note {
    pub text: String,
}
