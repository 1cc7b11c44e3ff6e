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
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::bail;
use missive::prelude::*;
use missive_test::prelude::*;
use parking_lot::Mutex;

use crate::setup::*;

mod setup;

/// One sender and three receivers; the middle receiver always fails.
struct Fixture {
    distributor: MessageDistributor,
    sender: Arc<DelegateHandler>,
    healthy_hits: Arc<AtomicUsize>,
}

fn fixture() -> anyhow::Result<Fixture> {
    let distributor = MessageDistributor::with_config(MissiveConfig::default());
    let sender = DelegateHandler::new("sender");
    let receivers = [
        DelegateHandler::new("first"),
        DelegateHandler::new("broken"),
        DelegateHandler::new("third"),
    ];
    distributor
        .register_handler(sender.clone(), true)?
        .register_for_send::<Ping>();
    for receiver in &receivers {
        distributor
            .register_handler(receiver.clone(), true)?
            .register_for_receive::<Ping>();
    }
    distributor.initialize()?;

    let healthy_hits = Arc::new(AtomicUsize::new(0));
    for receiver in &receivers {
        let hits = healthy_hits.clone();
        let broken = receiver.name() == "broken";
        receiver.subscribe_payload(
            move |ping: &Ping| {
                if broken {
                    bail!("cannot handle ping {}", ping.sequence);
                }
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            DeliveryMode::CURRENT,
        )?;
    }

    Ok(Fixture {
        distributor,
        sender,
        healthy_hits,
    })
}

#[missive_test]
async fn test_one_failing_subscriber_does_not_block_the_rest() -> anyhow::Result<()> {
    initialize_tracing();
    let fixture = fixture()?;

    let mut ping = fixture.sender.create_message::<Ping>()?;
    ping.message_mut().sequence = 9;
    let result = ping.send();

    assert_eq!(fixture.healthy_hits.load(Ordering::SeqCst), 2);
    let Err(MissiveError::Delivery(error)) = result else {
        panic!("expected a delivery error");
    };
    assert_eq!(error.failures.len(), 1);
    assert_eq!(error.failures[0].handler_name, "broken");
    assert_eq!(error.failures[0].error.to_string(), "cannot handle ping 9");
    assert_eq!(error.message_id, ping.id());
    assert_eq!(error.message_type, MessageTypeKey::of::<Ping>());
    assert!(ping.is_sent(), "a failed delivery still counts as sent");
    Ok(())
}

#[missive_test]
async fn test_a_handling_hook_absorbs_delivery_failures() -> anyhow::Result<()> {
    initialize_tracing();
    let fixture = fixture()?;
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = reports.clone();
    fixture.distributor.events().on_send_failed(move |failure| {
        sink.lock().push((
            failure.handler_name.clone(),
            failure.error.failures.len(),
            failure.context.id(),
        ));
        true
    });

    let mut ping = fixture.sender.create_message::<Ping>()?;
    ping.send()?;

    let reports = reports.lock().clone();
    assert_eq!(reports, vec![("sender".to_string(), 1, ping.id())]);
    assert_eq!(fixture.healthy_hits.load(Ordering::SeqCst), 2);
    Ok(())
}

#[missive_test]
async fn test_hooks_that_decline_leave_the_error_to_the_caller() -> anyhow::Result<()> {
    initialize_tracing();
    let fixture = fixture()?;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    fixture.distributor.events().on_send_failed(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        false
    });

    let result = fixture.sender.create_message::<Ping>()?.send();

    assert!(matches!(result, Err(MissiveError::Delivery(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[missive_test]
async fn test_every_failure_is_collected() -> anyhow::Result<()> {
    initialize_tracing();
    let fixture = fixture()?;
    let extra = DelegateHandler::new("also-broken");
    fixture
        .distributor
        .register_handler(extra.clone(), true)?
        .register_for_receive::<Ping>();
    extra.subscribe_payload(|_: &Ping| bail!("first failure"), DeliveryMode::CURRENT)?;
    extra.subscribe_payload(|_: &Ping| bail!("second failure"), DeliveryMode::CURRENT)?;

    let result = fixture.sender.create_message::<Ping>()?.send();

    let Err(MissiveError::Delivery(error)) = result else {
        panic!("expected a delivery error");
    };
    let names: Vec<_> = error.failures.iter().map(|f| f.handler_name.as_str()).collect();
    assert_eq!(names, vec!["broken", "also-broken", "also-broken"]);
    assert_eq!(fixture.healthy_hits.load(Ordering::SeqCst), 2);
    Ok(())
}
