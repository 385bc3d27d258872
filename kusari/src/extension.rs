//! Interpreter extensions.
//!
//! An [`Extension`] registers additional operations and types against a
//! running interpreter. Everything it registers must carry
//! [`Origin::Plugin`] so a revoke pass can strip it out again without
//! touching core or user definitions.
//!
//! [`Origin::Plugin`]: crate::registry::Origin::Plugin

use crate::interp::Interp;

pub trait Extension {
    /// Short name, for diagnostics.
    fn name(&self) -> &str;

    /// Register this extension's operations and types.
    fn install(&self, interp: &mut Interp);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::registry::{Arity, Entry, Operands, OpResult, Origin};

    struct Shouter;

    impl Extension for Shouter {
        fn name(&self) -> &str {
            "shouter"
        }

        fn install(&self, interp: &mut Interp) {
            fn shout(_: &mut Interp, args: Operands) -> OpResult {
                let text = args.str_arg(0, "shout")?;
                Ok(Message::with_value(text.to_uppercase().into()))
            }
            interp.ops_mut().register(
                Entry::native("shout", Arity::Exact(1), shout).with_origin(Origin::Plugin),
            );
        }
    }

    #[test]
    fn install_then_revoke() {
        let mut interp = Interp::new();
        interp.install(&Shouter);
        assert!(interp.ops().lookup("shout").is_some());

        let m = interp.exec_line(r#"shout("hey")"#);
        assert_eq!(m.value().as_str(), "HEY");

        interp.revoke_plugins();
        assert!(interp.ops().lookup("shout").is_none());
        assert!(interp.ops().lookup("print").is_some());
    }
}
