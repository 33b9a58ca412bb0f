//! The status bar runtime
//!
//! Owns the widget list, polls widgets on their own intervals and writes a
//! status line to i3bar whenever the combined output changes. Clicks read
//! from stdin are routed back to the widget that produced the block.

use std::io::Write;
use std::time::Duration;

use calloop::channel::{self, Channel};
use calloop::signals::{Signal, Signals};
use calloop::timer::{TimeoutAction, Timer};
use calloop::EventLoop;
use tracing::{debug, error, info, warn};

use crate::error::{BarError, Result};
use crate::input::{button_to_input, execute_action, Input};
use crate::protocol::{ClickEvent, Header, Segment, StatusWriter};
use crate::update::UpdateScheduler;
use crate::widget::{UpdateSource, Widget, WidgetAction, WidgetUpdate};

/// Lower bound between timer wakeups
const MIN_TICK: Duration = Duration::from_millis(100);

pub struct Bar<W: Write> {
    widgets: Vec<Box<dyn Widget>>,
    /// Instance id per widget, used as the block `name`
    ids: Vec<String>,
    scheduler: UpdateScheduler,
    writer: StatusWriter<W>,
    last_line: Option<Vec<Segment>>,
    /// Fatal error raised inside an event loop callback
    failure: Option<BarError>,
    running: bool,
}

impl<W: Write> Bar<W> {
    pub fn new(widgets: Vec<(String, Box<dyn Widget>)>, writer: W) -> Self {
        let (ids, widgets): (Vec<_>, Vec<_>) = widgets.into_iter().unzip();
        let scheduler = UpdateScheduler::new(widgets.iter().map(|w| w.update_interval()).collect());

        Self {
            widgets,
            ids,
            scheduler,
            writer: StatusWriter::new(writer),
            last_line: None,
            failure: None,
            running: true,
        }
    }

    /// Write the protocol header and schedule every widget for a first poll
    pub fn start(&mut self) -> Result<()> {
        self.writer.write_header(&Header::default())?;
        self.scheduler.force_update_all();
        self.tick()
    }

    /// Poll due widgets and write a status line if anything changed
    pub fn tick(&mut self) -> Result<()> {
        for index in self.scheduler.check_updates() {
            let widget = &mut self.widgets[index];
            widget.update();
            if let Some(err) = widget.error() {
                debug!(widget = %self.ids[index], error = %err, "Widget reported an error");
            }
        }
        self.render()?;
        Ok(())
    }

    /// Current status line
    pub fn line(&self) -> Vec<Segment> {
        self.widgets
            .iter()
            .zip(&self.ids)
            .filter_map(|(widget, id)| widget.output().map(|out| out.tagged(id)))
            .flatten()
            .collect()
    }

    /// Write the status line unless it equals the previous one
    pub fn render(&mut self) -> Result<bool> {
        let line = self.line();
        if self.last_line.as_ref() == Some(&line) {
            return Ok(false);
        }

        self.writer.write_line(&line)?;
        self.last_line = Some(line);
        Ok(true)
    }

    /// Route a click to the widget named in the event
    pub fn handle_click(&mut self, event: &ClickEvent) -> Result<()> {
        let Some(name) = event.name.as_deref() else {
            debug!(button = event.button, "Click without a block name");
            return Ok(());
        };

        let Some(index) = self.ids.iter().position(|id| id == name) else {
            debug!(name = %name, "Click for unknown widget");
            return Ok(());
        };

        let widget = &mut self.widgets[index];
        let action = match button_to_input(event.button) {
            Input::Click(button) => widget.on_click(button),
            Input::Scroll(direction) => widget.on_scroll(direction),
        };

        match action {
            Some(WidgetAction::Refresh) => self.scheduler.force_update(index),
            Some(action) => {
                if let Err(e) = execute_action(action) {
                    warn!(widget = %name, error = %e, "Click action failed");
                }
            }
            None => {}
        }

        self.tick()
    }

    /// Hand a pushed result to a widget and redraw
    pub fn push_update(&mut self, index: usize, update: WidgetUpdate) -> Result<()> {
        let widget = &mut self.widgets[index];
        widget.apply_update(update);
        if let Some(err) = widget.error() {
            debug!(widget = %self.ids[index], error = %err, "Widget reported an error");
        }
        self.render()?;
        Ok(())
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    fn fail(&mut self, e: BarError) {
        error!(error = %e, "Stopping status bar");
        self.failure = Some(e);
        self.running = false;
    }

    /// Run until SIGINT/SIGTERM or until writing to i3bar fails
    pub fn run(mut self, clicks: Channel<ClickEvent>) -> Result<()> {
        let mut event_loop: EventLoop<Self> =
            EventLoop::try_new().map_err(|e| BarError::EventLoop(e.to_string()))?;
        let handle = event_loop.handle();

        handle
            .insert_source(Timer::immediate(), |_deadline, _metadata, bar| {
                if let Err(e) = bar.tick() {
                    bar.fail(e);
                }
                TimeoutAction::ToDuration(bar.scheduler.time_until_next_update().max(MIN_TICK))
            })
            .map_err(|e| BarError::EventLoop(e.error.to_string()))?;

        handle
            .insert_source(clicks, |event, _metadata, bar| match event {
                channel::Event::Msg(click) => {
                    if let Err(e) = bar.handle_click(&click) {
                        bar.fail(e);
                    }
                }
                channel::Event::Closed => debug!("Click reader finished"),
            })
            .map_err(|e| BarError::EventLoop(e.error.to_string()))?;

        let sources: Vec<_> = self
            .widgets
            .iter_mut()
            .enumerate()
            .filter_map(|(index, widget)| widget.take_update_source().map(|source| (index, source)))
            .collect();
        for (index, source) in sources {
            match source {
                UpdateSource::Github(results) => handle
                    .insert_source(results, move |event, _metadata, bar| match event {
                        channel::Event::Msg(result) => {
                            if let Err(e) = bar.push_update(index, WidgetUpdate::Github(result)) {
                                bar.fail(e);
                            }
                        }
                        channel::Event::Closed => {
                            debug!(widget = %bar.ids[index], "Update source closed")
                        }
                    })
                    .map_err(|e| BarError::EventLoop(e.error.to_string()))?,
            };
        }

        let signals = Signals::new(&[Signal::SIGINT, Signal::SIGTERM])
            .map_err(|e| BarError::EventLoop(e.to_string()))?;
        handle
            .insert_source(signals, |event, _metadata, bar| {
                info!(signal = ?event.signal(), "Received signal, exiting");
                bar.running = false;
            })
            .map_err(|e| BarError::EventLoop(e.error.to_string()))?;

        self.start()?;
        info!(widgets = self.widget_count(), "Status bar running");

        while self.running {
            event_loop
                .dispatch(None, &mut self)
                .map_err(|e| BarError::EventLoop(e.to_string()))?;
        }

        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GithubError;
    use crate::github::Notifications;
    use crate::protocol::Output;
    use crate::widget::{MouseButton, ScrollDirection, WidgetInfo};

    struct Counter {
        value: i32,
    }

    impl Widget for Counter {
        fn info(&self) -> WidgetInfo {
            WidgetInfo {
                id: "counter",
                name: "Counter",
            }
        }

        fn update(&mut self) {}

        fn output(&self) -> Option<Output> {
            (self.value >= 0).then(|| Output::text(self.value.to_string()))
        }

        fn update_interval(&self) -> Duration {
            Duration::from_secs(3600)
        }

        fn on_click(&mut self, button: MouseButton) -> Option<WidgetAction> {
            match button {
                MouseButton::Left => {
                    self.value += 1;
                    Some(WidgetAction::Refresh)
                }
                _ => None,
            }
        }

        fn on_scroll(&mut self, direction: ScrollDirection) -> Option<WidgetAction> {
            if direction == ScrollDirection::Down {
                self.value -= 1;
            }
            None
        }

        fn apply_update(&mut self, update: WidgetUpdate) {
            let WidgetUpdate::Github(result) = update;
            if let Ok(notifications) = result {
                self.value = notifications.total() as i32;
            }
        }
    }

    fn counter(value: i32) -> Box<dyn Widget> {
        Box::new(Counter { value })
    }

    fn click(name: &str, button: u8) -> ClickEvent {
        ClickEvent {
            name: Some(name.to_string()),
            instance: Some("0".to_string()),
            button,
            x: 0,
            y: 0,
            modifiers: Vec::new(),
        }
    }

    fn lines(bar: Bar<Vec<u8>>) -> Vec<String> {
        String::from_utf8(bar.into_writer())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_start_writes_header_and_first_line() {
        let mut bar = Bar::new(vec![("a".to_string(), counter(1))], Vec::new());
        bar.start().unwrap();

        let lines = lines(bar);
        assert_eq!(lines[0], r#"{"version":1,"click_events":true}"#);
        assert_eq!(lines[1], "[");
        assert_eq!(lines[2], r#"[{"full_text":"1","name":"a","instance":"0"}],"#);
    }

    #[test]
    fn test_unchanged_output_not_rewritten() {
        let mut bar = Bar::new(vec![("a".to_string(), counter(1))], Vec::new());
        bar.start().unwrap();
        assert!(!bar.render().unwrap());
        bar.tick().unwrap();
        assert_eq!(lines(bar).len(), 3);
    }

    #[test]
    fn test_hidden_widget_omitted() {
        let bar = Bar::new(
            vec![("a".to_string(), counter(-1)), ("b".to_string(), counter(2))],
            Vec::new(),
        );
        let line = bar.line();
        assert_eq!(line.len(), 1);
        assert_eq!(line[0].name.as_deref(), Some("b"));
    }

    #[test]
    fn test_click_routed_by_name() {
        let mut bar = Bar::new(
            vec![("a".to_string(), counter(1)), ("b".to_string(), counter(5))],
            Vec::new(),
        );
        bar.start().unwrap();

        bar.handle_click(&click("b", 1)).unwrap();
        bar.handle_click(&click("a", 5)).unwrap();
        bar.handle_click(&click("nope", 1)).unwrap();

        let lines = lines(bar);
        assert_eq!(lines.len(), 5);
        assert!(lines[3].contains(r#""full_text":"6""#));
        assert!(lines[4].contains(r#""full_text":"0""#));
    }

    #[test]
    fn test_refresh_action_polls_widget() {
        let mut bar = Bar::new(vec![("a".to_string(), counter(1))], Vec::new());
        bar.start().unwrap();
        bar.handle_click(&click("a", 1)).unwrap();
        let line = bar.line();
        assert_eq!(line[0].full_text, "2");
        assert!(bar.scheduler.time_until_next_update() > Duration::ZERO);
    }

    #[test]
    fn test_pushed_update_redraws() {
        let mut bar = Bar::new(vec![("a".to_string(), counter(1))], Vec::new());
        bar.start().unwrap();

        let notifications = Notifications::from_reasons(["mention", "author", "author"]);
        bar.push_update(0, WidgetUpdate::Github(Ok(notifications))).unwrap();
        // Failed fetch leaves the line alone
        bar.push_update(0, WidgetUpdate::Github(Err(GithubError::Unauthorized)))
            .unwrap();

        let lines = lines(bar);
        assert_eq!(lines.len(), 4);
        assert!(lines[3].contains(r#""full_text":"3""#));
    }
}
