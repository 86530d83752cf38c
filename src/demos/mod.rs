//! Demonstration suites
//!
//! The suites the `suite-runner` binary ships with. Each one exercises a
//! different part of the assertion interface.

use std::num::ParseIntError;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use crate::models::Suite;
use crate::registry::{RegistryError, SuiteRegistry};

/// Register every demonstration suite
pub fn register_all(registry: &mut SuiteRegistry) -> Result<(), RegistryError> {
    registry.register(essential())?;
    registry.register(setup_teardown())?;
    registry.register(container_tests())?;
    registry.register(error_handling())?;
    Ok(())
}

/// Essential checks in setup and teardown with no tests in between
fn essential() -> Suite {
    let value = Arc::new(AtomicI32::new(0));
    let (on_setup, on_teardown) = (Arc::clone(&value), value);

    Suite::new("Essential")
        .setup(move |ctx| {
            on_setup.store(10, Ordering::SeqCst);
            // A failure here fails the whole suite.
            ctx.essential(on_setup.load(Ordering::SeqCst) == 10)
        })
        .teardown(move |ctx| {
            ctx.essential(on_teardown.load(Ordering::SeqCst) == 10)?;
            on_teardown.store(0, Ordering::SeqCst);
            Ok(())
        })
}

fn setup_teardown() -> Suite {
    let value = Arc::new(AtomicI32::new(0));
    let (on_setup, in_test, on_teardown) = (Arc::clone(&value), Arc::clone(&value), value);

    Suite::new("setup/teardown")
        .setup(move |_| {
            on_setup.store(10, Ordering::SeqCst);
            Ok(())
        })
        .test("", move |ctx| {
            ctx.check(in_test.load(Ordering::SeqCst) == 10);
            Ok(())
        })
        .teardown(move |_| {
            on_teardown.store(0, Ordering::SeqCst);
            Ok(())
        })
}

fn container_tests() -> Suite {
    Suite::new("Container Tests").test("bounds testing", |ctx| {
        let values = vec![0, 1, 2];

        for (i, value) in values.iter().enumerate() {
            ctx.check(*value == i);
        }

        ctx.expect_panic(|| values[4]);
        ctx.expect_no_panic(|| values[0]);
        Ok(())
    })
}

fn error_handling() -> Suite {
    Suite::new("Error Handling")
        .test("parse failures", |ctx| {
            ctx.expect_error::<ParseIntError, _, _>(|| "forty-two".parse::<i32>());
            ctx.expect_ok(|| "42".parse::<i32>());
            Ok(())
        })
        .test("required values", |ctx| {
            let parsed = "7".parse::<u8>();
            ctx.essential(parsed.is_ok())?;
            ctx.check(parsed == Ok(7));
            Ok(())
        })
}
