//! Input handling for widget interactions
//!
//! i3bar reports clicks as a JSON array on stdin. This module reads that
//! stream, maps button codes onto widget input, and executes the actions
//! widgets request in response.

use std::io::BufRead;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::protocol::{parse_click_line, ClickEvent};
use crate::widget::{MouseButton, ScrollDirection, WidgetAction};

/// A decoded i3bar button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Click(MouseButton),
    Scroll(ScrollDirection),
}

/// Convert an X11 button number from i3bar into widget input
pub fn button_to_input(button: u8) -> Input {
    match button {
        1 => Input::Click(MouseButton::Left),
        2 => Input::Click(MouseButton::Middle),
        3 => Input::Click(MouseButton::Right),
        4 => Input::Scroll(ScrollDirection::Up),
        5 => Input::Scroll(ScrollDirection::Down),
        6 => Input::Scroll(ScrollDirection::Left),
        7 => Input::Scroll(ScrollDirection::Right),
        other => Input::Click(MouseButton::Other(other)),
    }
}

/// Read click events until `reader` is exhausted, passing each one to `sink`.
///
/// Malformed lines are logged and skipped. Stops early when `sink` returns
/// false (the receiving side went away).
pub fn read_clicks<R, F>(reader: R, mut sink: F)
where
    R: BufRead,
    F: FnMut(ClickEvent) -> bool,
{
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to read click event stream");
                break;
            }
        };

        match parse_click_line(&line) {
            None => continue,
            Some(Ok(event)) => {
                debug!(name = ?event.name, instance = ?event.instance, button = event.button, "Click event");
                if !sink(event) {
                    break;
                }
            }
            Some(Err(e)) => {
                warn!(error = %e, line = %line, "Ignoring malformed click event");
            }
        }
    }
    debug!("Click event stream closed");
}

/// Spawn a thread forwarding stdin click events into the event loop
pub fn spawn_stdin_reader(sender: calloop::channel::Sender<ClickEvent>) -> Result<()> {
    std::thread::Builder::new()
        .name("click-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            read_clicks(stdin.lock(), |event| sender.send(event).is_ok());
        })
        .context("Failed to spawn click reader thread")?;
    Ok(())
}

/// Execute a widget action
///
/// Opens URLs with proper error handling and logging. `Refresh` is handled
/// by the bar.
pub fn execute_action(action: WidgetAction) -> Result<()> {
    match action {
        WidgetAction::OpenUrl(url) => {
            info!(url = %url, "Executing action: OpenUrl");
            open_url(&url)?;
        }
        WidgetAction::Refresh => {
            debug!("Executing action: Refresh (handled by bar)");
        }
    }
    Ok(())
}

/// Open a URL in the default browser
fn open_url(url: &str) -> Result<()> {
    std::process::Command::new("xdg-open")
        .arg(url)
        .spawn()
        .with_context(|| format!("Failed to open URL: {}", url))?;

    info!(url = %url, "Opened URL in browser");
    Ok(())
}
