//! Line-oriented terminal front end for a counting session.

use std::io::{BufRead, Write};

use anyhow::Result;

use crate::{
    counting::{CountingSessionManager, CountingSummary, SessionPhase, Transition},
    settings::CountingSettings,
};

const HELP: &str = "commands: count <qty> [obs] | skip <reason> | notfound <reason> | \
next | prev | goto <n> | pause | resume | status | done | reset | help | quit";

#[derive(Debug, PartialEq)]
enum Command<'a> {
    Count { quantity: &'a str, observations: Option<&'a str> },
    Skip(&'a str),
    NotFound(&'a str),
    Next,
    Previous,
    GoTo(&'a str),
    Pause,
    Resume,
    Status,
    Done,
    Reset,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_ascii_lowercase().as_str() {
        "count" | "c" => {
            let (quantity, observations) = match rest.split_once(char::is_whitespace) {
                Some((qty, obs)) if !obs.trim().is_empty() => (qty, Some(obs.trim())),
                Some((qty, _)) => (qty, None),
                None => (rest, None),
            };
            Command::Count { quantity, observations }
        }
        "skip" | "s" => Command::Skip(rest),
        "notfound" | "nf" => Command::NotFound(rest),
        "next" | "n" => Command::Next,
        "prev" | "p" => Command::Previous,
        "goto" | "g" => Command::GoTo(rest),
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "status" => Command::Status,
        "done" => Command::Done,
        "reset" => Command::Reset,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(line),
    }
}

pub struct CountingShell<'a> {
    manager: &'a mut CountingSessionManager,
    settings: CountingSettings,
}

impl<'a> CountingShell<'a> {
    pub fn new(manager: &'a mut CountingSessionManager, settings: CountingSettings) -> Self {
        Self { manager, settings }
    }

    /// Reads commands until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        writeln!(out, "{HELP}")?;
        self.render(out)?;

        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if !self.handle(parse_command(&line), out)? {
                break;
            }
            self.render(out)?;
        }
        Ok(())
    }

    fn handle<W: Write>(&mut self, command: Command<'_>, out: &mut W) -> Result<bool> {
        match command {
            Command::Count { quantity, observations } => {
                let Some(item) = self.manager.current_item() else {
                    writeln!(out, "no item to count")?;
                    return Ok(true);
                };
                let product_id = item.product_id.clone();
                let validation = self.manager.validate_quantity(quantity);
                for error in &validation.errors {
                    writeln!(out, "error: {error}")?;
                }
                for warning in &validation.warnings {
                    writeln!(out, "warning: {warning}")?;
                }
                if let Some(quantity) = validation.quantity.filter(|_| validation.is_valid) {
                    let transition = self.manager.count_item(
                        &product_id,
                        quantity,
                        observations.map(str::to_string),
                    );
                    report(out, &transition)?;
                }
            }
            Command::Skip(reason) => {
                let transition = self.manager.skip_item(reason);
                report(out, &transition)?;
            }
            Command::NotFound(reason) => {
                let transition = self.manager.mark_not_found(reason);
                report(out, &transition)?;
            }
            Command::Next => {
                if !self.manager.go_next() {
                    writeln!(out, "already at the last item")?;
                }
            }
            Command::Previous => {
                if !self.manager.go_previous() {
                    writeln!(out, "already at the first item")?;
                }
            }
            Command::GoTo(raw) => {
                // Positions are shown 1-based.
                let moved = raw
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .is_some_and(|index| self.manager.go_to_index(index));
                if !moved {
                    writeln!(out, "no item at position '{raw}'")?;
                }
            }
            Command::Pause => self.manager.pause(),
            Command::Resume => self.manager.resume(),
            Command::Status => {}
            Command::Done => {
                match self.manager.complete() {
                    Some(summary) => print_summary(out, summary, &self.settings)?,
                    None => writeln!(out, "no session to complete")?,
                }
            }
            Command::Reset => {
                self.manager.reset();
                writeln!(out, "session cleared")?;
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(false),
            Command::Unknown(line) => writeln!(out, "unknown command '{line}'; try help")?,
        }
        Ok(true)
    }

    fn render<W: Write>(&self, out: &mut W) -> Result<()> {
        let progress = self.manager.progress();
        let phase = match self.manager.phase() {
            SessionPhase::Uninitialized => "idle",
            SessionPhase::Active => "active",
            SessionPhase::Paused => "paused",
            SessionPhase::Completed => "completed",
        };

        writeln!(
            out,
            "[{phase}] {:.1}% | counted {} skipped {} not found {} of {}",
            progress.percentage, progress.counted, progress.skipped, progress.not_found, progress.total
        )?;

        if let Some(eta) = self.manager.estimated_time_remaining() {
            writeln!(out, "about {} min left", eta.num_minutes())?;
        }

        if let Some(item) = self.manager.current_item() {
            writeln!(
                out,
                "#{} {} {} (expected {})",
                self.manager.current_index() + 1,
                item.product_code(),
                item.product_name(),
                item.expected_quantity
            )?;
        }
        Ok(())
    }
}

fn report<W: Write>(out: &mut W, transition: &Transition) -> Result<()> {
    match transition {
        Transition::Applied { .. } => {}
        Transition::Kept { index } => {
            writeln!(out, "item {} is already counted; count it again to change it", index + 1)?
        }
        Transition::Ignored(reason) => writeln!(out, "ignored: {reason:?}")?,
    }
    Ok(())
}

fn print_summary<W: Write>(
    out: &mut W,
    summary: &CountingSummary,
    settings: &CountingSettings,
) -> Result<()> {
    let limit = settings.discrepancy_preview_limit;
    writeln!(out, "{}", serde_json::to_string_pretty(summary)?)?;
    writeln!(
        out,
        "finished in {} min, {} large discrepancies",
        summary.duration().num_minutes(),
        summary.large_discrepancies(settings.large_difference_ratio).count()
    )?;

    for discrepancy in summary.discrepancies.iter().take(limit) {
        writeln!(
            out,
            "{} ({}): expected {} counted {} ({:+} / {:.1}%)",
            discrepancy.product_name,
            discrepancy.product_code,
            discrepancy.expected,
            discrepancy.counted,
            discrepancy.difference,
            discrepancy.percentage_diff
        )?;
    }
    if summary.discrepancies.len() > limit {
        writeln!(
            out,
            "+ {} more discrepancies in the full summary",
            summary.discrepancies.len() - limit
        )?;
    }
    Ok(())
}
