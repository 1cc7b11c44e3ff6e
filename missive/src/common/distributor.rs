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
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::SystemTime;

use static_assertions::assert_impl_all;
use tracing::{debug, instrument, trace};

use crate::common::config::CONFIG;
use crate::common::subscription_table::callback_address;
use crate::common::{
    DistributorEvents, DistributorInner, HandlerContext, HandlerId, MessageTypeKey, MissiveConfig,
    Registration,
};
use crate::handler::{AggregateHandlerConfiguration, MessageHandlerConfiguration};
use crate::message::MissiveError;
use crate::traits::{MessageHandler, MissiveMessage};

/// An in-process publish/subscribe hub.
///
/// Handlers are registered with their send and receive permissions; once the
/// distributor is initialized each handler holds a [`HandlerContext`] through
/// which it subscribes and sends. A sent message reaches every *other*
/// registered handler allowed to receive its type.
///
/// Cloning yields another handle to the same distributor. The distributor is
/// disposed when [`dispose`](Self::dispose) is called or the last handle is
/// dropped.
///
/// ```rust,ignore
/// let distributor = MessageDistributor::new();
/// distributor.declare_factory::<Box<dyn NewContact>, _>(|| Box::new(Contact::default()));
///
/// distributor
///     .register_handler(outlook.clone(), true)?
///     .register_for::<Box<dyn NewContact>>(MessageDirections::Both);
/// distributor
///     .register_handler(thunderbird.clone(), true)?
///     .register_for::<Box<dyn NewContact>>(MessageDirections::Both);
/// distributor.initialize()?;
/// ```
#[derive(Clone)]
pub struct MessageDistributor {
    inner: Arc<DistributorInner>,
}

assert_impl_all!(MessageDistributor: Send, Sync);

impl Default for MessageDistributor {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageDistributor {
    /// Creates a distributor using the global [`CONFIG`].
    pub fn new() -> Self {
        Self::with_config(CONFIG.clone())
    }

    pub fn with_config(config: MissiveConfig) -> Self {
        Self::with_clock(config, SystemTime::now)
    }

    /// Creates a distributor that stamps envelopes and log entries with `clock`.
    pub fn with_clock<F>(config: MissiveConfig, clock: F) -> Self
    where
        F: Fn() -> SystemTime + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(DistributorInner::new(config, Arc::new(clock))),
        }
    }

    /// Registers a handler and returns its permission configuration.
    ///
    /// When `owns_handler` is set the distributor disposes the handler when
    /// it is itself disposed. A handler registered after
    /// [`initialize`](Self::initialize) receives its context right away.
    ///
    /// # Errors
    /// - [`MissiveError::InvalidArgument`] if this handler instance is already registered.
    /// - [`MissiveError::ObjectDisposed`] if the distributor is disposed.
    pub fn register_handler<H: MessageHandler>(
        &self,
        handler: Arc<H>,
        owns_handler: bool,
    ) -> Result<Arc<MessageHandlerConfiguration>, MissiveError> {
        self.register(handler, owns_handler)
    }

    /// Registers several handlers and returns a configuration that applies to all of them.
    ///
    /// Registration stops at the first failure; handlers registered before it stay registered.
    pub fn register_handlers<I>(
        &self,
        handlers: I,
        owns_handlers: bool,
    ) -> Result<AggregateHandlerConfiguration, MissiveError>
    where
        I: IntoIterator<Item = Arc<dyn MessageHandler>>,
    {
        let configurations = handlers
            .into_iter()
            .map(|handler| self.register(handler, owns_handlers))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AggregateHandlerConfiguration::new(
            configurations,
            self.inner.catalog.clone(),
            owns_handlers,
        ))
    }

    #[instrument(skip(self, handler), fields(handler_name = %handler.name()))]
    fn register(
        &self,
        handler: Arc<dyn MessageHandler>,
        owns_handler: bool,
    ) -> Result<Arc<MessageHandlerConfiguration>, MissiveError> {
        let name = match handler.name() {
            name if name.trim().is_empty() => self.inner.config.defaults.handler_name.clone(),
            name => name,
        };
        let handler_id = self.inner.next_handler_id();
        let configuration = Arc::new(MessageHandlerConfiguration::new(
            handler_id,
            name.clone(),
            self.inner.catalog.clone(),
            owns_handler,
        ));
        let context = HandlerContext::new(
            handler_id,
            name,
            &handler,
            configuration.clone(),
            Arc::downgrade(&self.inner),
        );

        let initialized = {
            let mut registrations = self.inner.registrations.write();
            if self.inner.is_disposed() {
                return Err(MissiveError::ObjectDisposed("message distributor".to_string()));
            }
            let address = callback_address(&handler);
            if registrations
                .iter()
                .any(|registration| callback_address(&registration.handler) == address)
            {
                return Err(MissiveError::InvalidArgument(format!(
                    "handler `{}` is already registered",
                    handler.name()
                )));
            }
            registrations.push(Registration {
                context: context.clone(),
                handler: handler.clone(),
            });
            self.inner.initialized.load(Ordering::SeqCst)
        };

        debug!(%handler_id, owns_handler, "handler registered");
        if initialized {
            handler.update_context(context);
        }
        Ok(configuration)
    }

    /// Removes a registration without disposing the handler.
    /// Returns whether a registration was removed.
    #[instrument(skip(self))]
    pub fn unregister_handler(&self, handler_id: HandlerId) -> bool {
        let removed = {
            let mut registrations = self.inner.registrations.write();
            registrations
                .iter()
                .position(|registration| registration.context.handler_id() == handler_id)
                .map(|index| registrations.remove(index))
        };
        match removed {
            Some(registration) => {
                registration.context.clear_subscriptions();
                debug!("handler unregistered");
                true
            }
            None => false,
        }
    }

    /// Hands every registered handler its context.
    ///
    /// # Errors
    /// - [`MissiveError::AlreadyInitialized`] on a second call.
    /// - [`MissiveError::ObjectDisposed`] if the distributor is disposed.
    #[instrument(skip(self))]
    pub fn initialize(&self) -> Result<(), MissiveError> {
        let pending = {
            let registrations = self.inner.registrations.write();
            if self.inner.is_disposed() {
                return Err(MissiveError::ObjectDisposed("message distributor".to_string()));
            }
            if self.inner.initialized.swap(true, Ordering::SeqCst) {
                return Err(MissiveError::AlreadyInitialized);
            }
            registrations
                .iter()
                .map(|registration| (registration.handler.clone(), registration.context.clone()))
                .collect::<Vec<_>>()
        };

        debug!(handlers = pending.len(), "initializing distributor");
        for (handler, context) in pending {
            trace!(handler = %context.handler_id(), "updating context");
            handler.update_context(context);
        }
        Ok(())
    }

    /// Disposes every owned handler and drops all registrations.
    ///
    /// Every owned handler is attempted. Calling this again does nothing.
    /// Background deliveries already scheduled keep running.
    ///
    /// # Errors
    /// [`MissiveError::Disposal`] listing the handlers whose `dispose` failed.
    #[instrument(skip(self))]
    pub fn dispose(&self) -> Result<(), MissiveError> {
        self.inner.dispose()
    }

    /// Declares the instance created for message type `T`: `C::default()` converted into `T`.
    pub fn declare_instance<T, C>(&self) -> &Self
    where
        T: MissiveMessage,
        C: Default + Into<T> + 'static,
    {
        self.declare_factory::<T, _>(|| C::default().into())
    }

    /// Declares how payloads of message type `T` are created.
    ///
    /// This is how message contracts get a concrete type:
    ///
    /// ```rust,ignore
    /// distributor.declare_factory::<Box<dyn NewContact>, _>(|| Box::new(Contact::default()));
    /// ```
    pub fn declare_factory<T, F>(&self, factory: F) -> &Self
    where
        T: MissiveMessage,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.inner.catalog.declare_factory::<T>(Arc::new(factory));
        self
    }

    /// Makes `T` known by name for
    /// [`register_for_send_named`](crate::traits::HandlerConfiguration::register_for_send_named)
    /// and [`message_type`](Self::message_type).
    pub fn register_message_type<T: MissiveMessage>(&self) -> MessageTypeKey {
        let key = MessageTypeKey::of::<T>();
        self.inner.catalog.remember(key);
        key
    }

    /// Looks a known message type up by full or short name.
    ///
    /// # Errors
    /// [`MissiveError::InvalidArgument`] if the name is blank or unknown.
    pub fn message_type(&self, name: &str) -> Result<MessageTypeKey, MissiveError> {
        self.inner.catalog.lookup(name)
    }

    pub fn events(&self) -> &DistributorEvents {
        &self.inner.events
    }

    /// Resolves once every background delivery scheduled so far has finished.
    pub async fn wait_for_background(&self) {
        self.inner.background.wait().await;
    }

    /// Background deliveries scheduled and not yet finished.
    pub fn pending_background_deliveries(&self) -> usize {
        self.inner.background.outstanding()
    }

    pub fn handler_count(&self) -> usize {
        self.inner.registrations.read().len()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::SeqCst)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// The distributor's current time.
    pub fn now(&self) -> SystemTime {
        self.inner.now()
    }

    pub fn config(&self) -> &MissiveConfig {
        &self.inner.config
    }
}

impl fmt::Debug for MessageDistributor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDistributor")
            .field("handlers", &self.handler_count())
            .field("initialized", &self.is_initialized())
            .field("disposed", &self.is_disposed())
            .field("events", &self.inner.events)
            .finish()
    }
}
