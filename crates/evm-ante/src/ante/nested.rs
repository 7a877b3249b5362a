//! Limits on messages wrapped in `MsgExec` and on grants.

use super::{AnteDecorator, Next};
use crate::{constants::limits::MAX_NESTED_MSG_DEPTH, AnteError, Context, Msg, Tx};

/// Restricts what may be executed through delegated authority.
///
/// Messages wrapped into [`Msg::Exec`] are checked against a list of disabled message types, and
/// wrappers may nest at most [`MAX_NESTED_MSG_DEPTH`] levels deep. Grants authorizing a disabled
/// message type are rejected wherever they appear. A disabled message submitted directly by its
/// own signer is not restricted.
#[derive(Debug, Clone, Default)]
pub struct NestedMessageGuard {
    disabled: Vec<String>,
}

impl NestedMessageGuard {
    /// Creates a guard rejecting the given message type URLs.
    pub const fn new(disabled: Vec<String>) -> Self {
        Self { disabled }
    }

    /// Returns `true` if the message type is disabled.
    pub fn is_disabled(&self, type_url: &str) -> bool {
        self.disabled.iter().any(|disabled| disabled == type_url)
    }

    /// Checks `msgs`, found at `depth` wrappers deep.
    ///
    /// Messages are visited depth-first, left to right, and the first violation is returned.
    pub fn check(&self, msgs: &[Msg], depth: usize, inside_wrapper: bool) -> Result<(), AnteError> {
        for msg in msgs {
            match msg {
                Msg::Exec(exec) => {
                    if depth >= MAX_NESTED_MSG_DEPTH {
                        return Err(AnteError::MaxDepthExceeded { limit: MAX_NESTED_MSG_DEPTH });
                    }
                    self.check(&exec.msgs, depth + 1, true)?;
                }
                Msg::Grant(grant) => {
                    let type_url = grant.authorization.msg_type_url();
                    if self.is_disabled(type_url) {
                        return Err(AnteError::DisabledMessageType {
                            type_url: type_url.to_string(),
                        });
                    }
                }
                msg => {
                    if inside_wrapper && self.is_disabled(msg.type_url()) {
                        return Err(AnteError::DisabledMessageType {
                            type_url: msg.type_url().to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl AnteDecorator for NestedMessageGuard {
    fn name(&self) -> &'static str {
        "nested_msgs"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        self.check(tx.msgs(), 0, false)?;
        next.run(ctx, tx, simulate)
    }
}
