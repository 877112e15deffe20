//! Station Tour
//!
//! This example walks a simulated app through its screens.
//!
//! Key concepts:
//! - Entering the first station through an entry point
//! - Trips between stations
//! - Checking in and out of a facility (a dialog)
//! - Reading the diagnostic dump of a failed transition
//!
//! Run with: cargo run --example station_tour

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use transit::core::SharedCondition;
use transit::{
    FnCondition, TransitConfig, TransitError, TransitSession, TransitionBuilder, TransitionOptions,
};

/// A screen element of the simulated app.
#[derive(Clone)]
struct Widget(Arc<AtomicBool>);

impl Widget {
    fn new(visible: bool) -> Self {
        Self(Arc::new(AtomicBool::new(visible)))
    }

    fn show(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    fn visible(&self, id: &str) -> SharedCondition {
        let widget = self.clone();
        FnCondition::predicate(id, move || widget.0.load(Ordering::SeqCst)).shared()
    }
}

fn main() -> Result<(), TransitError> {
    println!("=== Station Tour ===\n");

    let config = TransitConfig {
        default_timeout_ms: 500,
        poll_interval_ms: 10,
        ..TransitConfig::default()
    };
    let mut session = TransitSession::new(config)?;

    let login_form = Widget::new(false);
    let inbox_list = Widget::new(false);
    let compose_dialog = Widget::new(false);
    let never_shown = Widget::new(false);

    let login = session.create_station("Login", |e| {
        e.declare_element(login_form.visible("login-form"));
    })?;
    let inbox = session.create_station("Inbox", |e| {
        e.declare_element(inbox_list.visible("inbox-list"));
    })?;
    let compose = session.create_facility(inbox, "Compose", |e| {
        e.declare_element(compose_dialog.visible("compose-dialog"));
    })?;
    let settings = session.create_station("Settings", |e| {
        e.declare_element(never_shown.visible("settings-title"));
    })?;

    // App launch
    let arrival = session.enter_entry_point(login, || login_form.show())?;
    println!("Launched into {}", session.state(login).map_or("?", |s| s.name()));
    println!("{}", arrival.report);

    // Log in: the form must disappear and the inbox must appear
    let arrival = session.travel_to(login, inbox, || {
        login_form.hide();
        inbox_list.show();
    })?;
    println!("Logged in after {}ms", arrival.elapsed.as_millis());
    println!("{}", arrival.report);

    // Open and close a dialog on top of the inbox
    session.enter_facility(inbox, compose, || compose_dialog.show())?;
    println!("Compose dialog open, inbox still active: {:?}", session.active_station());
    session.exit_facility(inbox, compose, || compose_dialog.hide())?;
    println!("Compose dialog closed\n");

    // A trigger that never takes effect
    let broken = TransitionBuilder::trip()
        .from(inbox)
        .to(settings)
        .options(TransitionOptions::new().with_tries(2).with_timeout_ms(100))
        .build()?;
    match session.execute(broken, || {}) {
        Ok(_) => println!("Unexpected arrival at settings"),
        Err(err) => {
            println!("Trip to settings failed as expected:");
            println!("{}", err);
            if let Some(failure) = err.failure() {
                let missing: Vec<_> = failure
                    .report
                    .unfulfilled()
                    .map(|row| row.description.as_str())
                    .collect();
                println!("Still waiting for: {}", missing.join(", "));
            }
        }
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
