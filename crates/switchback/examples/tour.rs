#![forbid(unsafe_code)]

//! A guided tour of routing against a headless stage: registration, URL
//! resolution, pushes, interactive pops, preferred sheets, and popups.
//!
//! Run with `cargo run -p switchback --example tour`.

use std::time::Duration;

use switchback::kurbo::{Rect, Vec2};
use switchback::prelude::*;
use switchback::{Pan, PanPhase, PopupOptions, PresentOptions, PresentStyle};

#[derive(Default)]
struct Inbox;
impl Screen for Inbox {}

#[derive(Default)]
struct Thread {
    subject: Option<String>,
}

impl Screen for Thread {
    fn assign(&mut self, key: &str, value: &Value) -> bool {
        if key == "subject" {
            self.subject = value.as_str().map(str::to_string);
            return true;
        }
        false
    }

    fn did_appear(&mut self, animated: bool) {
        tracing::info!(subject = ?self.subject, animated, "thread appeared");
    }
}

/// Prefers to come up as a sheet inside its own nav shell; `Auto` routes
/// obey the destination's preference.
#[derive(Default)]
struct Compose;

impl Screen for Compose {
    fn preferred_config(&self) -> Option<RouteConfig> {
        Some(RouteConfig::Present(
            PresentOptions::WRAP_NAV,
            PresentStyle::Sheet,
        ))
    }
}

#[derive(Default)]
struct Alert;
impl Screen for Alert {}

fn step(director: &mut Director, seconds: f64) {
    director.tick(Duration::from_secs_f64(seconds));
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut director = Director::new(Rect::new(0.0, 0.0, 400.0, 800.0));
    let inbox = director.stage_mut().insert(Box::new(Inbox));
    let nav = director.stage_mut().insert_nav(inbox)?;
    director.stage_mut().set_root(nav)?;

    director.hub().register_screen::<Thread>("mail/thread");
    director.hub().register_screen::<Compose>("mail/compose");
    let handle = director.handle();

    // Push by URL; the query lands through `Screen::assign`.
    let route = Route::from_url(director.hub(), "route://mail/thread?subject=hello")?;
    handle.submit_with(route, Box::new(|| tracing::info!("push settled")));
    step(&mut director, 0.5);

    // Swipe the thread back out, past the finish threshold.
    director.nav_pan(nav, Pan::new(PanPhase::Began, Vec2::ZERO));
    director.nav_pan(nav, Pan::new(PanPhase::Changed, Vec2::new(260.0, 0.0)));
    director.nav_pan(nav, Pan::new(PanPhase::Ended, Vec2::new(260.0, 0.0)));
    step(&mut director, 0.5);
    tracing::info!(screens = director.stage().len(), "back on the inbox");

    handle.submit(Route::from_key(director.hub(), "mail/compose")?);
    step(&mut director, 0.5);
    let sheet = director.stage().presented(nav).expect("the sheet is up");

    // The synthesized shell's back control dismisses at the stack root.
    director.trigger_back_affordance(sheet);
    step(&mut director, 0.5);

    // Popups float on the overlay and never join the hierarchy.
    let popup = Route::to_screen::<Alert>().with_config(RouteConfig::Popup(PopupOptions::empty()));
    handle.submit(popup);
    step(&mut director, 0.5);
    tracing::info!(overlay = ?director.stage().overlay(), "alert floats");
    director.tap_popup_backdrop();
    step(&mut director, 0.5);

    tracing::info!(screens = director.stage().len(), "tour over");
    Ok(())
}
