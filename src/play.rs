pub mod demo;

use std::io::{BufRead, Write};

use anyhow::{bail, Result};
use log::{info, warn};
use serde_json::json;

use crate::block::BranchingBlock;
use crate::events::Publisher;
use crate::scenario::Node;
use crate::traversal::LearnerState;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PlayerConfig {
    /// Studio submission to load. The built-in demo is used when absent.
    pub scenario_path: Option<String>,
    /// Learner state to resume from and write back on exit.
    pub state_path: Option<String>,
}

impl PlayerConfig {
    /// Positional arguments: `[scenario.json] [state.json]`.
    pub fn from_args(args: &[String]) -> Self {
        Self {
            scenario_path: args.get(1).cloned(),
            state_path: args.get(2).cloned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Round outcome
// ---------------------------------------------------------------------------

/// How a single playthrough ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    /// The learner reached an end node.
    Finished {
        terminal_node_id: String,
        steps_taken: usize,
        score: Option<(f64, f64)>,
    },
    /// The learner typed quit, or input ran out.
    Quit,
}

enum Command {
    Choose(i64),
    Undo,
    Reset,
    Quit,
    Unknown,
}

fn parse_command(input: &str) -> Command {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q")
        || input.eq_ignore_ascii_case("quit")
        || input.eq_ignore_ascii_case("exit")
    {
        return Command::Quit;
    }
    if input.eq_ignore_ascii_case("u") {
        return Command::Undo;
    }
    if input.eq_ignore_ascii_case("r") {
        return Command::Reset;
    }
    match input.parse::<i64>() {
        // Choices are shown starting from 1.
        Ok(n) => Command::Choose(n - 1),
        Err(_) => Command::Unknown,
    }
}

/// Read one line. `None` once input is exhausted.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn show_node<W: Write>(out: &mut W, node: &Node, undo: bool, reset: bool) -> Result<()> {
    writeln!(out, "\n{}", node.content)?;
    if !node.hint.is_empty() {
        writeln!(out, "  (hint: {})", node.hint)?;
    }
    if node.is_terminal() {
        return Ok(());
    }
    writeln!(out)?;
    for (i, choice) in node.choices.iter().enumerate() {
        writeln!(out, "  [{}] {}", i + 1, choice.text)?;
    }
    let mut extras = Vec::new();
    if undo {
        extras.push("[u] Undo");
    }
    if reset {
        extras.push("[r] Reset");
    }
    extras.push("[q] Quit");
    writeln!(out, "  {}", extras.join("    "))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Single round
// ---------------------------------------------------------------------------

pub fn play_round<P, R, W>(
    block: &mut BranchingBlock<P>,
    input: &mut R,
    out: &mut W,
) -> Result<RoundOutcome>
where
    P: Publisher,
    R: BufRead,
    W: Write,
{
    block.ensure_started();
    if block.get_current_state().current_node.is_none() && !block.scenario.is_empty() {
        warn!("Saved position no longer exists in the scenario, starting over");
        block.learner = LearnerState::default();
        block.ensure_started();
    }

    let mut steps_taken = 0;
    loop {
        let state = block.get_current_state();
        let Some(node) = state.current_node else {
            bail!("scenario has no start node");
        };
        info!(
            "Current node: {} (terminal={}, choices={})",
            node.id,
            node.is_terminal(),
            node.choices.len()
        );
        show_node(out, &node, state.enable_undo, state.enable_reset_activity)?;

        if node.is_terminal() {
            return Ok(RoundOutcome::Finished {
                terminal_node_id: node.id,
                steps_taken,
                score: state
                    .enable_scoring
                    .then_some((state.score, state.max_score)),
            });
        }

        write!(out, "\n> ")?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            return Ok(RoundOutcome::Quit);
        };
        if line.is_empty() {
            writeln!(out, "(Please pick an option.)")?;
            continue;
        }

        let response = match parse_command(&line) {
            Command::Quit => return Ok(RoundOutcome::Quit),
            Command::Choose(index) => {
                let response = block.select_choice(&json!({ "choice_index": index }));
                if response.success {
                    steps_taken += 1;
                    let feedback = usize::try_from(index)
                        .ok()
                        .and_then(|i| node.choice(i))
                        .and_then(|c| c.feedback.as_deref());
                    if let Some(feedback) = feedback {
                        writeln!(out, "({feedback})")?;
                    }
                }
                response
            }
            Command::Undo => {
                let response = block.undo_choice();
                if response.success {
                    steps_taken = steps_taken.saturating_sub(1);
                }
                response
            }
            Command::Reset => {
                let response = block.reset_activity();
                if response.success {
                    steps_taken = 0;
                }
                response
            }
            Command::Unknown => {
                writeln!(out, "(Unknown option: {line})")?;
                continue;
            }
        };

        if let Some(error) = response.error {
            writeln!(out, "({error})")?;
        }
    }
}

// ---------------------------------------------------------------------------
// Game over screen
// ---------------------------------------------------------------------------

pub fn show_game_over<W: Write>(out: &mut W, outcome: &RoundOutcome) -> Result<()> {
    writeln!(out, "\n========================================")?;
    writeln!(out, "             SCENARIO OVER")?;
    writeln!(out, "========================================")?;

    match outcome {
        RoundOutcome::Finished {
            terminal_node_id,
            steps_taken,
            score,
        } => {
            writeln!(out, "  Steps:    {steps_taken}")?;
            if let Some((score, max_score)) = score {
                writeln!(out, "  Score:    {score} / {max_score}")?;
            }
            writeln!(out, "  Ended at: {terminal_node_id}")?;
        }
        RoundOutcome::Quit => {
            writeln!(out, "  You left the scenario.")?;
        }
    }

    writeln!(out, "========================================\n")?;
    Ok(())
}

/// Returns `true` to play again, `false` to quit.
fn prompt_restart<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<bool> {
    writeln!(out, "  [r] Restart    [q] Quit\n")?;
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            return Ok(false);
        };
        match line.to_lowercase().as_str() {
            "r" => return Ok(true),
            "q" => return Ok(false),
            _ => writeln!(out, "  Press [r] to restart or [q] to quit.")?,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point: plays rounds until the learner quits
// ---------------------------------------------------------------------------

pub fn run<P, R, W>(block: &mut BranchingBlock<P>, input: &mut R, out: &mut W) -> Result<()>
where
    P: Publisher,
    R: BufRead,
    W: Write,
{
    loop {
        writeln!(out, "\n========================================")?;
        writeln!(out, "   {}", block.settings.display_name.to_uppercase())?;
        writeln!(out, "========================================")?;

        let outcome = play_round(block, input, out)?;
        show_game_over(out, &outcome)?;
        if outcome == RoundOutcome::Quit || !prompt_restart(input, out)? {
            writeln!(out, "Thanks for playing!")?;
            break;
        }

        info!("Learner chose to restart");
        if block.settings.enable_reset_activity {
            block.reset_activity();
        } else {
            block.learner = LearnerState::default();
        }
    }

    Ok(())
}
