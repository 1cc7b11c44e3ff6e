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
use std::sync::Arc;

use missive::prelude::*;
use missive_test::prelude::*;

use crate::setup::*;

mod setup;

fn distributor() -> MessageDistributor {
    let distributor = MessageDistributor::with_config(MissiveConfig::default());
    distributor.declare_instance::<NewContactMessage, Contact>();
    distributor
}

#[missive_test]
async fn test_initialize_hands_out_contexts_once() -> anyhow::Result<()> {
    initialize_tracing();
    let distributor = distributor();
    let outlook = AddressBook::named("Outlook");
    let configuration = distributor.register_handler(outlook.clone(), true)?;

    assert!(outlook.context().is_err(), "no context before initialize");
    distributor.initialize()?;
    assert!(distributor.is_initialized());

    let context = outlook.context()?;
    assert_eq!(context.handler_id(), configuration.handler_id());
    assert_eq!(context.handler_name(), "Outlook");
    assert!(matches!(
        distributor.initialize(),
        Err(MissiveError::AlreadyInitialized)
    ));
    Ok(())
}

#[missive_test]
async fn test_late_registrations_get_a_context_immediately() -> anyhow::Result<()> {
    initialize_tracing();
    let distributor = distributor();
    let outlook = AddressBook::named("Outlook");
    distributor
        .register_handler(outlook.clone(), true)?
        .register_for_send::<NewContactMessage>();
    distributor.initialize()?;

    let late = AddressBook::named("Late");
    distributor
        .register_handler(late.clone(), true)?
        .register_for_receive::<NewContactMessage>();
    assert!(late.context().is_ok());

    outlook.add_contact("Katherine Johnson", "katherine@example.com")?;
    assert_eq!(late.received(), vec!["Katherine Johnson"]);
    Ok(())
}

#[missive_test]
async fn test_handlers_register_only_once() -> anyhow::Result<()> {
    initialize_tracing();
    let distributor = distributor();
    let outlook = AddressBook::named("Outlook");
    let first = distributor.register_handler(outlook.clone(), true)?;
    let second = distributor.register_handler(outlook.clone(), true);

    assert!(matches!(second, Err(MissiveError::InvalidArgument(_))));
    assert_eq!(distributor.handler_count(), 1);

    let other = distributor.register_handler(AddressBook::named("Outlook"), true)?;
    assert_ne!(first.handler_id(), other.handler_id(), "ids are unique per registration");
    Ok(())
}

#[missive_test]
async fn test_dispose_cascades_to_owned_handlers_only() -> anyhow::Result<()> {
    initialize_tracing();
    let distributor = distributor();
    let owned = AddressBook::named("owned");
    let borrowed = AddressBook::named("borrowed");
    let released = AddressBook::named("released");
    distributor.register_handler(owned.clone(), true)?;
    distributor.register_handler(borrowed.clone(), false)?;
    distributor
        .register_handler(released.clone(), true)?
        .set_owns_handler(false);
    distributor.initialize()?;

    distributor.dispose()?;
    assert!(distributor.is_disposed());
    assert_eq!(owned.disposals(), 1);
    assert_eq!(borrowed.disposals(), 0);
    assert_eq!(released.disposals(), 0);
    assert_eq!(distributor.handler_count(), 0);

    distributor.dispose()?;
    assert_eq!(owned.disposals(), 1, "dispose is idempotent");
    Ok(())
}

#[missive_test]
async fn test_disposal_failures_are_aggregated() -> anyhow::Result<()> {
    initialize_tracing();
    let distributor = distributor();
    let first = AddressBook::stubborn("first");
    let fine = AddressBook::named("fine");
    let second = AddressBook::stubborn("second");
    distributor
        .register_handlers(
            [
                first.clone() as Arc<dyn MessageHandler>,
                fine.clone() as Arc<dyn MessageHandler>,
                second.clone() as Arc<dyn MessageHandler>,
            ],
            true,
        )?;

    let Err(MissiveError::Disposal(error)) = distributor.dispose() else {
        panic!("expected a disposal error");
    };
    let names: Vec<_> = error.failures.iter().map(|f| f.handler_name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);
    assert_eq!(fine.disposals(), 1);
    assert!(error.to_string().contains("first refused to close"));
    Ok(())
}

#[missive_test]
async fn test_a_disposed_distributor_rejects_registrations() -> anyhow::Result<()> {
    initialize_tracing();
    let distributor = distributor();
    distributor.dispose()?;

    let result = distributor.register_handler(AddressBook::named("late"), true);
    assert!(matches!(result, Err(MissiveError::ObjectDisposed(_))));
    assert!(matches!(
        distributor.initialize(),
        Err(MissiveError::ObjectDisposed(_))
    ));
    Ok(())
}

#[missive_test]
async fn test_dropping_the_last_handle_disposes() -> anyhow::Result<()> {
    initialize_tracing();
    let owned = AddressBook::named("owned");
    {
        let distributor = distributor();
        let clone = distributor.clone();
        clone.register_handler(owned.clone(), true)?;
        drop(clone);
        assert_eq!(owned.disposals(), 0);
    }
    assert_eq!(owned.disposals(), 1);
    assert!(owned.is_disposed());
    Ok(())
}

#[missive_test]
async fn test_unregistered_handlers_stop_receiving() -> anyhow::Result<()> {
    initialize_tracing();
    let distributor = distributor();
    let outlook = AddressBook::named("Outlook");
    let thunderbird = AddressBook::named("Thunderbird");
    distributor
        .register_handler(outlook.clone(), true)?
        .register_for_send::<NewContactMessage>();
    let receiving = distributor.register_handler(thunderbird.clone(), true)?;
    receiving.register_for_receive::<NewContactMessage>();
    distributor.initialize()?;

    assert!(distributor.unregister_handler(receiving.handler_id()));
    assert!(!distributor.unregister_handler(receiving.handler_id()));
    outlook.add_contact("Hedy Lamarr", "hedy@example.com")?;

    assert!(thunderbird.received().is_empty());
    assert!(!thunderbird.is_disposed(), "unregistering does not dispose");
    assert_eq!(distributor.handler_count(), 1);
    Ok(())
}

#[missive_test]
async fn test_aggregate_configuration_applies_to_every_member() -> anyhow::Result<()> {
    initialize_tracing();
    let distributor = distributor();
    let outlook = AddressBook::named("Outlook");
    let thunderbird = AddressBook::named("Thunderbird");
    let evolution = AddressBook::named("Evolution");
    let aggregate = distributor.register_handlers(
        [
            outlook.clone() as Arc<dyn MessageHandler>,
            thunderbird.clone() as Arc<dyn MessageHandler>,
            evolution.clone() as Arc<dyn MessageHandler>,
        ],
        true,
    )?;
    aggregate.register_for::<NewContactMessage>(MessageDirections::Both);
    distributor.initialize()?;

    assert_eq!(aggregate.len(), 3);
    assert!(aggregate.can_send::<NewContactMessage>());
    assert!(aggregate.owns_handler());

    evolution.add_contact("Margaret Hamilton", "margaret@example.com")?;
    assert_eq!(outlook.received(), vec!["Margaret Hamilton"]);
    assert_eq!(thunderbird.received(), vec!["Margaret Hamilton"]);
    assert!(evolution.received().is_empty());
    Ok(())
}
