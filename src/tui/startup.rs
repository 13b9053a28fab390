//! Startup screen shown while the repository and credentials are resolved.
//!
//! Each phase races its future against an 80ms spinner tick, so the animation
//! keeps moving during slow `gh` or network calls.

use crate::gh::executor::{self, GhClient};
use crate::gh::parser::RepoCoords;
use crate::traits::CiClient;
use crate::tui::spinner;
use color_eyre::eyre::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use std::future::Future;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(80);

#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    Running,
    Ok,
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone)]
struct Phase {
    label: &'static str,
    detail: Option<String>,
    outcome: Outcome,
}

pub struct StartupResult {
    pub coords: RepoCoords,
    pub client: GhClient,
    pub default_branch: Option<String>,
}

/// Checklist of startup phases, newest last.
#[derive(Debug, Default)]
struct Checklist {
    phases: Vec<Phase>,
    frame: usize,
}

impl Checklist {
    fn current(&mut self) -> Option<&mut Phase> {
        self.phases.last_mut()
    }

    fn draw<B: Backend>(&self, terminal: &mut Terminal<B>) {
        if let Err(e) = terminal.draw(|f| self.render(f)) {
            tracing::warn!("startup render failed: {e}");
        }
    }

    fn render(&self, f: &mut Frame) {
        let height = u16::try_from(self.phases.len() + 2).unwrap_or(u16::MAX);
        let rows = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(f.area());

        let title = Line::from(Span::styled(
            "  tgh",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
        let lines: Vec<Line> = [title, Line::from("")]
            .into_iter()
            .chain(self.phases.iter().map(|p| self.phase_line(p)))
            .collect();
        f.render_widget(Paragraph::new(lines), rows[1]);
    }

    fn phase_line<'a>(&self, phase: &'a Phase) -> Line<'a> {
        let (icon, color) = match &phase.outcome {
            Outcome::Running => (spinner::frame(self.frame).to_string(), Color::Yellow),
            Outcome::Ok => ("✓".to_string(), Color::Green),
            Outcome::Skipped => ("–".to_string(), Color::DarkGray),
            Outcome::Failed(_) => ("✗".to_string(), Color::Red),
        };
        let mut spans = vec![
            Span::styled(format!("  {icon} "), Style::default().fg(color)),
            Span::styled(phase.label, Style::default().fg(Color::White)),
        ];
        if let Some(detail) = &phase.detail {
            spans.push(Span::styled(
                format!("  {detail}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        if let Outcome::Failed(msg) = &phase.outcome {
            spans.push(Span::styled(
                format!("  {msg}"),
                Style::default().fg(Color::Red),
            ));
        }
        Line::from(spans)
    }

    /// Run `fut` as a new phase, animating until it resolves.
    async fn run<B, F, T>(&mut self, terminal: &mut Terminal<B>, label: &'static str, fut: F) -> Result<T>
    where
        B: Backend,
        F: Future<Output = Result<T>>,
    {
        self.phases.push(Phase {
            label,
            detail: None,
            outcome: Outcome::Running,
        });
        self.draw(terminal);

        let mut ticker = tokio::time::interval(TICK);
        tokio::pin!(fut);
        let result = loop {
            tokio::select! {
                result = &mut fut => break result,
                _ = ticker.tick() => {
                    self.frame = self.frame.wrapping_add(1);
                    self.draw(terminal);
                }
            }
        };

        if let Some(phase) = self.current() {
            phase.outcome = match &result {
                Ok(_) => Outcome::Ok,
                Err(e) => Outcome::Failed(e.to_string()),
            };
        }
        self.draw(terminal);
        result
    }

    fn annotate<B: Backend>(&mut self, terminal: &mut Terminal<B>, detail: String, outcome: Option<Outcome>) {
        if let Some(phase) = self.current() {
            phase.detail = Some(detail);
            if let Some(outcome) = outcome {
                phase.outcome = outcome;
            }
        }
        self.draw(terminal);
    }
}

pub async fn run_startup<B: Backend>(terminal: &mut Terminal<B>) -> Result<StartupResult> {
    let mut checklist = Checklist::default();

    checklist
        .run(terminal, "Checking GitHub CLI", executor::check_available())
        .await?;

    let coords = checklist
        .run(terminal, "Detecting repository", executor::detect_repo())
        .await?;
    checklist.annotate(
        terminal,
        format!("{}/{} on {}", coords.owner, coords.repo, coords.host),
        None,
    );

    let token = checklist
        .run(terminal, "Reading auth token", executor::auth_token(&coords.host))
        .await?;
    let client = GhClient::new(coords.clone(), token)?;

    // Non-fatal: the dispatch form falls back to a fixed ref.
    let default_branch = match checklist
        .run(terminal, "Detecting default branch", client.get_default_branch())
        .await
    {
        Ok(branch) => {
            checklist.annotate(terminal, branch.clone(), None);
            Some(branch)
        }
        Err(e) => {
            tracing::warn!("default branch lookup failed: {e}");
            checklist.annotate(terminal, "(skipped)".to_string(), Some(Outcome::Skipped));
            None
        }
    };

    tracing::info!(
        host = %coords.host,
        repo = %format!("{}/{}", coords.owner, coords.repo),
        "startup complete"
    );

    Ok(StartupResult {
        coords,
        client,
        default_branch,
    })
}
