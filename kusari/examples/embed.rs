//! Embedding demo: drive the interpreter from Rust, extend it with a
//! plugin operation, then revoke the plugin again.
//!
//! Run with `cargo run --example embed`.

use kusari::{Arity, Entry, Extension, Interp, Message, OpResult, Operands, Origin};

/// Plugin adding a `shout(text)` operation that upper-cases its argument.
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

fn run(interp: &mut Interp, script: &str) {
    println!("--- {script:?}");
    let m = interp.exec_line(script);
    for line in interp.take_output() {
        println!("{line}");
    }
    if m.is_fatal() {
        println!("aborted: {}", m.detail);
    }
}

fn main() {
    let mut interp = Interp::new();

    run(&mut interp, "var greeting = \"hello from rust\"");
    run(&mut interp, "print(greeting)");

    interp.install(&Shouter);
    run(&mut interp, "print(shout(greeting))");

    // Values built on the Rust side can be passed straight to an operation.
    let m = interp.invoke("shout", vec!["direct call".into()]);
    println!("invoke -> {}", m.value());

    interp.revoke_plugins();
    run(&mut interp, "print(shout(greeting))");

    println!("--- event report");
    print!("{}", interp.tracker().report());
}
