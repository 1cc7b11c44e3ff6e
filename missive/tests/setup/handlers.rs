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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::bail;
use missive::prelude::*;
use parking_lot::Mutex;
use tracing::info;

use crate::setup::messages::{NewContact, NewContactMessage};

/// An address book that shares new contacts with the other address books
/// registered on the same distributor.
#[missive_handler]
pub struct AddressBook {
    state: HandlerState,
    label: String,
    received: Arc<Mutex<Vec<String>>>,
    disposals: AtomicUsize,
    refuse_dispose: bool,
}

impl AddressBook {
    pub fn named(label: &str) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            ..Default::default()
        })
    }

    /// An address book whose `dispose` fails.
    pub fn stubborn(label: &str) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            refuse_dispose: true,
            ..Default::default()
        })
    }

    /// Names of the contacts received from other address books.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }

    pub fn context(&self) -> Result<HandlerContext, MissiveError> {
        self.state.context()
    }

    /// Creates a contact locally and announces it.
    pub fn add_contact(&self, name: &str, email: &str) -> Result<(), MissiveError> {
        let mut message = self.state.context()?.create_contract_message::<NewContactMessage>()?;
        message.message_mut().set_name(name.to_string());
        message.message_mut().set_email(email.to_string());
        message.send()
    }
}

impl MessageHandler for AddressBook {
    fn name(&self) -> String {
        self.label.clone()
    }

    fn is_disposed(&self) -> bool {
        self.state.is_disposed()
    }

    fn update_context(&self, context: HandlerContext) {
        let received = self.received.clone();
        let label = self.label.clone();
        context.subscribe(
            move |message: &mut MessageContext<NewContactMessage>| {
                info!(address_book = %label, contact = message.message().name(), "contact received");
                received.lock().push(message.message().name().to_string());
                Ok(())
            },
            DeliveryMode::CURRENT,
        );
        self.state.set_context(context);
    }

    fn dispose(&self) -> anyhow::Result<()> {
        self.state.dispose();
        self.disposals.fetch_add(1, Ordering::SeqCst);
        if self.refuse_dispose {
            bail!("{} refused to close", self.label);
        }
        Ok(())
    }
}
