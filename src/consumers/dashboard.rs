use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::dop::compute_dop;
use crate::geodesy::Ecef;
use crate::store::{Snapshot, TelemetryStore};
use crate::telemetry::MetricField;

const COLUMN_WIDTH: usize = 15;
const MIN_NAME_WIDTH: usize = 10;
const QUOTA_LIMIT: u32 = 1000;

/// Live table of the current record of every satellite.
pub struct Dashboard {
    store: TelemetryStore,
    fields: Vec<MetricField>,
    observer_ecef: Ecef,
    refresh: Duration,
}

impl Dashboard {
    pub fn new(
        store: TelemetryStore,
        fields: Vec<MetricField>,
        observer_ecef: Ecef,
        refresh: Duration,
    ) -> Self {
        Self {
            store,
            fields,
            observer_ecef,
            refresh,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> io::Result<()> {
        let mut screen = HiddenCursor::new(io::stdout())?;

        let mut ticker = interval(self.refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut iteration: u64 = 0;

        while !*shutdown.borrow() {
            let should_stop = tokio::select! {
                _ = ticker.tick() => false,
                _ = shutdown.changed() => true,
            };
            if should_stop {
                break;
            }

            let snapshot = self.store.snapshot();
            let frame = render(&snapshot, &self.fields, self.observer_ecef, Utc::now(), iteration);
            execute!(screen.out, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
            screen.out.write_all(frame.as_bytes())?;
            screen.out.flush()?;
            iteration += 1;
        }

        Ok(())
    }
}

/// Hides the cursor for its lifetime; shows it again on drop, error paths included.
struct HiddenCursor<W: Write> {
    out: W,
}

impl<W: Write> HiddenCursor<W> {
    fn new(mut out: W) -> io::Result<Self> {
        execute!(out, cursor::Hide)?;
        Ok(Self { out })
    }
}

impl<W: Write> Drop for HiddenCursor<W> {
    fn drop(&mut self) {
        let _ = execute!(self.out, cursor::Show);
    }
}

/// Renders one dashboard frame. Pure, so it runs with no lock held.
pub fn render(
    snapshot: &Snapshot,
    fields: &[MetricField],
    observer_ecef: Ecef,
    now: DateTime<Utc>,
    iteration: u64,
) -> String {
    let counters = snapshot.counters();
    let quota = counters
        .quota_used
        .map(|q| q.to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "Satellite Tracker | {}", now.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(
        out,
        "Requests Last Hour (Max: {}): {} | Iterations: {}",
        QUOTA_LIMIT, quota, iteration
    );
    let _ = writeln!(
        out,
        "Net Time to Fetch: {:.2} s | Net Time to Process: {:.2} s",
        counters.fetch_time_total.as_secs_f64(),
        counters.process_time_total.as_secs_f64()
    );
    let _ = writeln!(out, "{}", dop_line(snapshot, observer_ecef, now.timestamp()));
    let _ = writeln!(out, "Press Ctrl + C to exit");
    let _ = writeln!(out);

    let names: Vec<String> = snapshot.iter().map(|s| s.id().to_string()).collect();
    let name_width = names
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(MIN_NAME_WIDTH)
        .max(MIN_NAME_WIDTH)
        + 2;

    let _ = write!(out, "{:^width$}", "Satellite", width = name_width);
    for field in fields {
        let _ = write!(out, "{:^width$} ", field.label(), width = COLUMN_WIDTH - 1);
    }
    let _ = writeln!(out);

    if snapshot.is_empty() {
        let _ = writeln!(out, "Waiting for the first positions...");
    }
    for (series, name) in snapshot.iter().zip(&names) {
        let _ = write!(out, "{:<width$}", name, width = name_width);
        if let Some(metric) = series.current_at(now.timestamp()) {
            for field in fields {
                let _ = write!(out, "{:>width$} ", field.format(metric), width = COLUMN_WIDTH - 1);
            }
        }
        let _ = writeln!(out);
    }

    out
}

fn dop_line(snapshot: &Snapshot, observer_ecef: Ecef, now: i64) -> String {
    let visible: Vec<Ecef> = snapshot
        .iter()
        .filter_map(|series| series.current_at(now))
        .filter(|metric| metric.visible)
        .map(|metric| metric.sat_ecef)
        .collect();

    match compute_dop(&visible, observer_ecef) {
        Ok(dop) => format!(
            "Visible: {} | GDOP {:.2} | PDOP {:.2} | HDOP {:.2} | VDOP {:.2} | TDOP {:.2}",
            visible.len(),
            dop.gdop,
            dop.pdop,
            dop.hdop,
            dop.vdop,
            dop.tdop
        ),
        Err(e) => {
            log::debug!("DOP unavailable: {}", e);
            format!("Visible: {} | DOP unavailable: {}", visible.len(), e)
        }
    }
}
