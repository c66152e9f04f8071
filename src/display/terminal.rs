// src/display/terminal.rs
//! Terminal viewer polling the publisher once per second

use crate::{
    error::Result,
    gps::Fix,
    monitor::LinkState,
    publisher::Publisher,
};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType, DisableLineWrap, EnableLineWrap},
};
use log::error;
use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{sync::watch, time::sleep};

pub struct TerminalDisplay {
    refresh: Duration,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self {
            refresh: Duration::from_secs(1),
        }
    }

    /// Redraw until Ctrl+C
    pub async fn run(&self, publisher: &Publisher, link: watch::Receiver<LinkState>) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, Hide, DisableLineWrap)?;

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            running_clone.store(false, Ordering::Relaxed);
        });

        while running.load(Ordering::Relaxed) {
            execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;

            let state = *link.borrow();
            self.render_display(&mut stdout, &publisher.current_fix(), state)?;

            stdout.flush()?;
            sleep(self.refresh).await;
        }

        execute!(stdout, Show, EnableLineWrap)?;
        println!("\nShutting down...");
        Ok(())
    }

    /// Render one frame
    pub fn render_display(&self, out: &mut impl Write, fix: &Fix, link: LinkState) -> Result<()> {
        execute!(
            out,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print("GPS Tracker"),
            Print("\n"),
            Print("=".repeat(60)),
            Print("\n"),
            ResetColor
        )?;

        let link_str = match link {
            LinkState::Connected => "connected",
            LinkState::Disconnected => "disconnected",
        };
        let timestamp_str = if fix.timestamp.is_empty() {
            "No data received"
        } else {
            fix.timestamp.as_str()
        };
        execute!(
            out,
            Print(format!("Receiver: {}   Last fix: {}\n\n", link_str, timestamp_str))
        )?;

        self.render_position_section(out, fix)?;
        self.render_movement_section(out, fix)?;
        self.render_quality_section(out, fix)?;

        execute!(
            out,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print("Press Ctrl+C to exit"),
            Print("\n"),
            ResetColor
        )?;

        Ok(())
    }

    fn render_position_section(&self, out: &mut impl Write, fix: &Fix) -> Result<()> {
        execute!(
            out,
            SetForegroundColor(Color::Yellow),
            Print("POSITION:\n"),
            ResetColor
        )?;

        // Zero coordinates are "no fix yet", not a position at null island
        let (lat, lon) = if fix.has_position() {
            (
                Fix::format_coordinate(fix.latitude),
                Fix::format_coordinate(fix.longitude),
            )
        } else {
            ("No fix".to_string(), "No fix".to_string())
        };

        execute!(
            out,
            Print(format!("  Latitude:  {}\n", lat)),
            Print(format!("  Longitude: {}\n", lon)),
            Print(format!("  Altitude:  {:>12.1} m\n\n", fix.altitude))
        )?;
        Ok(())
    }

    fn render_movement_section(&self, out: &mut impl Write, fix: &Fix) -> Result<()> {
        execute!(
            out,
            SetForegroundColor(Color::Cyan),
            Print("MOVEMENT:\n"),
            ResetColor,
            Print(format!("  Speed:     {:>12.2} km/h\n\n", fix.speed))
        )?;
        Ok(())
    }

    fn render_quality_section(&self, out: &mut impl Write, fix: &Fix) -> Result<()> {
        execute!(
            out,
            SetForegroundColor(Color::Magenta),
            Print("QUALITY:\n"),
            ResetColor,
            Print(format!("  Satellites: {:>11}\n", fix.satellites)),
            Print(format!("  Fix Type:   {:>11}\n\n", fix.fix_description()))
        )?;
        Ok(())
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}
