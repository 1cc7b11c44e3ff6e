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
use crate::common::HandlerContext;

/// A participant in message distribution.
///
/// Handlers are registered with a [`MessageDistributor`](crate::common::MessageDistributor),
/// which hands each of them a [`HandlerContext`] once the distributor is
/// initialized. The context is the handler's only way to subscribe, create
/// messages and send them.
///
/// Most implementations embed a [`HandlerState`](crate::handler::HandlerState)
/// and delegate to it:
///
/// ```rust,ignore
/// #[missive_handler]
/// struct Outlook {
///     state: HandlerState,
/// }
///
/// impl MessageHandler for Outlook {
///     fn is_disposed(&self) -> bool {
///         self.state.is_disposed()
///     }
///
///     fn update_context(&self, context: HandlerContext) {
///         self.state.set_context(context);
///     }
///
///     fn dispose(&self) -> anyhow::Result<()> {
///         self.state.dispose();
///         Ok(())
///     }
/// }
/// ```
pub trait MessageHandler: Send + Sync + 'static {
    /// A human readable name used in logs and failure reports.
    fn name(&self) -> String {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full).to_string()
    }

    /// Whether the handler has been disposed. Disposed handlers receive no messages.
    fn is_disposed(&self) -> bool;

    /// Supplies the handler with its distributor context.
    ///
    /// Called once when the distributor is initialized, or at registration
    /// time for handlers registered afterwards.
    fn update_context(&self, context: HandlerContext);

    /// Releases the handler. Called by the distributor on disposal when the
    /// distributor owns the handler.
    fn dispose(&self) -> anyhow::Result<()>;
}
