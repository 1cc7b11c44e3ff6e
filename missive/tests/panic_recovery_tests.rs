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
//! Subscribers that panic. These use plain `#[tokio::test]` because
//! `#[missive_test]` fails any test during which a panic occurred.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use missive::prelude::*;
use parking_lot::Mutex;

use crate::setup::*;

mod setup;

fn ping_pair(config: MissiveConfig) -> anyhow::Result<(MessageDistributor, Arc<DelegateHandler>, Arc<DelegateHandler>)> {
    let distributor = MessageDistributor::with_config(config);
    let sender = DelegateHandler::new("sender");
    let receiver = DelegateHandler::new("receiver");
    distributor
        .register_handler(sender.clone(), true)?
        .register_for_send::<Ping>();
    distributor
        .register_handler(receiver.clone(), true)?
        .register_for_receive::<Ping>();
    distributor.initialize()?;
    Ok((distributor, sender, receiver))
}

#[tokio::test]
async fn test_panicking_subscriber_becomes_a_failure() -> anyhow::Result<()> {
    initialize_tracing();
    let (_distributor, sender, receiver) = ping_pair(MissiveConfig::default())?;
    let after = Arc::new(AtomicUsize::new(0));
    let counter = after.clone();
    receiver.subscribe_payload(|_: &Ping| panic!("subscriber exploded"), DeliveryMode::CURRENT)?;
    receiver.subscribe_payload(
        move |_: &Ping| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        DeliveryMode::CURRENT,
    )?;

    let result = sender.create_message::<Ping>()?.send();

    let Err(MissiveError::Delivery(error)) = result else {
        panic!("expected a delivery error");
    };
    assert_eq!(error.failures.len(), 1);
    assert!(error.failures[0].error.to_string().contains("subscriber exploded"));
    assert_eq!(after.load(Ordering::SeqCst), 1, "later subscribers still run");
    Ok(())
}

#[tokio::test]
async fn test_background_panics_reach_the_receive_hook() -> anyhow::Result<()> {
    initialize_tracing();
    let (distributor, sender, receiver) = ping_pair(MissiveConfig::default())?;
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();
    distributor.events().on_receive_failed(move |failure| {
        sink.lock().push(failure.error.to_string());
        true
    });
    receiver.subscribe_payload(
        |ping: &Ping| panic!("background ping {} exploded", ping.sequence),
        DeliveryMode::BACKGROUND,
    )?;

    let mut ping = sender.create_message::<Ping>()?;
    ping.message_mut().sequence = 5;
    ping.send()?;
    distributor.wait_for_background().await;

    let messages = messages.lock().clone();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("background ping 5 exploded"));
    Ok(())
}

#[tokio::test]
async fn test_panicking_dispose_is_reported() -> anyhow::Result<()> {
    initialize_tracing();
    #[missive_handler]
    struct Fragile {
        state: HandlerState,
    }

    impl MessageHandler for Fragile {
        fn is_disposed(&self) -> bool {
            self.state.is_disposed()
        }

        fn update_context(&self, context: HandlerContext) {
            self.state.set_context(context);
        }

        fn dispose(&self) -> anyhow::Result<()> {
            panic!("fragile handler broke while closing");
        }
    }

    let distributor = MessageDistributor::with_config(MissiveConfig::default());
    let steady = AddressBook::named("steady");
    distributor.register_handler(Arc::new(Fragile::default()), true)?;
    distributor.register_handler(steady.clone(), true)?;

    let Err(MissiveError::Disposal(error)) = distributor.dispose() else {
        panic!("expected a disposal error");
    };
    assert_eq!(error.failures.len(), 1);
    assert_eq!(error.failures[0].handler_name, "Fragile");
    assert_eq!(steady.disposals(), 1, "the remaining handlers are still disposed");
    Ok(())
}

#[tokio::test]
async fn test_a_panicking_recipient_does_not_stop_the_others() -> anyhow::Result<()> {
    initialize_tracing();
    let distributor = MessageDistributor::with_config(MissiveConfig::default());
    let sender = DelegateHandler::new("sender");
    let fragile = DelegateHandler::new("fragile");
    let steady = DelegateHandler::new("steady");
    distributor
        .register_handler(sender.clone(), true)?
        .register_for_send::<Ping>();
    distributor
        .register_handlers(
            [
                fragile.clone() as Arc<dyn MessageHandler>,
                steady.clone() as Arc<dyn MessageHandler>,
            ],
            true,
        )?
        .register_for_receive::<Ping>();
    distributor.initialize()?;

    let received = Arc::new(AtomicUsize::new(0));
    let counter = received.clone();
    fragile.subscribe_payload(|_: &Ping| panic!("fragile recipient broke"), DeliveryMode::CURRENT)?;
    steady.subscribe_payload(
        move |_: &Ping| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        DeliveryMode::CURRENT,
    )?;

    let result = sender.create_message::<Ping>()?.send();

    let Err(MissiveError::Delivery(error)) = result else {
        panic!("expected a delivery error");
    };
    assert_eq!(error.failures.len(), 1);
    assert_eq!(error.failures[0].handler_name, "fragile");
    assert_eq!(received.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_unhandled_background_panics_are_counted() -> anyhow::Result<()> {
    initialize_tracing();
    let (distributor, sender, receiver) = ping_pair(MissiveConfig::default())?;
    receiver.subscribe_payload(|_: &Ping| panic!("nobody is listening"), DeliveryMode::BACKGROUND)?;

    sender.create_message::<Ping>()?.send()?;
    distributor.wait_for_background().await;

    assert_eq!(distributor.events().unhandled_background_failures(), 1);
    Ok(())
}
