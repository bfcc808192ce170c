//! alex - command-line front end for the Alex meeting workflow
//!
//! Lists and inspects processed meetings, submits new recordings and
//! follows them to completion, aggregates action items, and manages local
//! preferences.

use alex_client::cache::QueryError;
use alex_client::services::DictationSession;
use alex_client::views::action_items::ActionItemBoard;
use alex_client::views::{
    dashboard, history, ActionItemFilter, DetailState, DueFilter, HistoryFilter,
    MeetingDetailView, StatusFilter,
};
use alex_client::workflow::{AudioFile, MeetingForm, ParticipantField, PollOutcome};
use alex_client::AppState;
use alex_common::config::ConfigResolver;
use alex_common::events::{AlexEvent, EventBus};
use alex_common::models::{Meeting, MeetingStatus};
use alex_common::preferences::{PreferencesStore, Theme};
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "alex")]
#[command(about = "Meeting minutes workflow client")]
#[command(version)]
struct Args {
    /// Backend base URL
    #[arg(long, global = true)]
    api_base_url: Option<String>,

    /// Config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List meetings, newest first
    Meetings {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Show one meeting
    Show {
        id: i64,
        /// Write `meeting-<id>-summary.txt` into this directory
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Upload a recording and follow processing to completion
    Process {
        #[arg(long)]
        title: String,
        /// Meeting date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long, value_name = "FILE")]
        audio: PathBuf,
        /// Participant as `Name,email`; repeatable. Saved participants are used when omitted
        #[arg(long = "participant", value_name = "NAME,EMAIL")]
        participants: Vec<String>,
    },
    /// Action items across all meetings
    ActionItems {
        #[arg(long)]
        assignee: Option<String>,
        /// all | completed | pending
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// all | overdue | today | week
        #[arg(long, default_value = "all")]
        due: DueFilter,
    },
    /// Search meeting history
    History {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        source: Option<String>,
    },
    /// Dashboard summary
    Dashboard,
    /// Run the instant follow-up agent on a transcript
    Followup {
        /// Transcript text; read from --file when omitted
        transcript: Option<String>,
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
        /// Dictate the transcript through the platform speech recognizer
        #[arg(long, conflicts_with_all = ["transcript", "file"])]
        dictate: bool,
    },
    /// Show or change the color theme
    Theme {
        /// dark | light | toggle
        value: Option<String>,
    },
    /// Manage saved participants
    Participants {
        #[command(subcommand)]
        action: ParticipantsAction,
    },
}

#[derive(Subcommand, Debug)]
enum ParticipantsAction {
    List,
    Add { name: String, email: String },
    Remove { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = ConfigResolver::new()
        .with_api_base_url(args.api_base_url.clone())
        .with_config_path(args.config.clone())
        .resolve()
        .context("Failed to resolve configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting alex v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(api_base_url = %settings.api_base_url, "Configuration resolved");

    let state = AppState::new(settings, EventBus::default())?;

    match args.command {
        Command::Meetings { limit, json } => list_meetings(&state, limit, json).await,
        Command::Show { id, export, json } => show_meeting(&state, id, export, json).await,
        Command::Process {
            title,
            date,
            audio,
            participants,
        } => process_meeting(&state, title, date, audio, participants).await,
        Command::ActionItems {
            assignee,
            status,
            due,
        } => action_items(&state, ActionItemFilter { assignee, status, due }).await,
        Command::History {
            search,
            status,
            source,
        } => {
            let filter = HistoryFilter {
                search,
                status: status.map(MeetingStatus::from),
                source,
            };
            meeting_history(&state, filter).await
        }
        Command::Dashboard => show_dashboard(&state).await,
        Command::Followup {
            transcript,
            file,
            dictate,
        } => run_followup(&state, transcript, file, dictate).await,
        Command::Theme { value } => theme(value),
        Command::Participants { action } => participants(action),
    }
}

fn query_failed(e: QueryError) -> anyhow::Error {
    anyhow!(e.message)
}

fn print_meeting_row(meeting: &Meeting) {
    println!(
        "{:>6}  {:<10}  {:<20}  {}",
        meeting.id,
        meeting.status,
        meeting.created_at,
        meeting.title
    );
}

async fn list_meetings(state: &AppState, limit: Option<u32>, json: bool) -> Result<()> {
    let meetings = state
        .queries
        .meetings_limited(limit)
        .await
        .map_err(query_failed)?;

    if json {
        println!("{}", serde_json::to_string_pretty(meetings.as_ref())?);
    } else if meetings.is_empty() {
        println!("No meetings yet");
    } else {
        meetings.iter().for_each(print_meeting_row);
    }
    Ok(())
}

async fn show_meeting(
    state: &AppState,
    id: i64,
    export: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let mut view = MeetingDetailView::new(state.queries.clone(), id);
    if let DetailState::Error(message) = view.load().await {
        bail!("{}", message);
    }
    let meeting = view
        .meeting()
        .ok_or_else(|| anyhow!("Meeting {} not loaded", id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(meeting)?);
    } else {
        println!("{} (ID {})", meeting.title, meeting.id);
        println!("Status:  {}", meeting.status);
        println!("Created: {}", meeting.created_at);
        if let Some(summary) = &meeting.summary {
            println!("\n{}\n", summary.trim());
        }
        for item in &meeting.action_items {
            let mark = if item.is_done() { "x" } else { " " };
            println!(
                "[{}] {} ({}, due {})",
                mark,
                item.description,
                item.owner.as_deref().unwrap_or("unassigned"),
                item.due_date.as_deref().unwrap_or("-")
            );
        }
    }

    if let Some(dir) = export {
        let path = view.write_summary(&dir).await?;
        println!("Summary written to {}", path.display());
    }
    Ok(())
}

async fn process_meeting(
    state: &AppState,
    title: String,
    date: Option<String>,
    audio: PathBuf,
    participants: Vec<String>,
) -> Result<()> {
    let mut form = MeetingForm::new();
    form.title = title;
    form.meeting_date = date.unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());

    let file = AudioFile::from_path(&audio)
        .await
        .with_context(|| format!("Failed to read {}", audio.display()))?;
    form.select_file(file)?;

    let mut pairs: Vec<(String, String)> = Vec::new();
    for raw in &participants {
        let (name, email) = raw
            .split_once(',')
            .ok_or_else(|| anyhow!("Participant must be NAME,EMAIL: {}", raw))?;
        pairs.push((name.trim().to_string(), email.trim().to_string()));
    }
    if pairs.is_empty() {
        let prefs = PreferencesStore::default_location()?.load();
        pairs = prefs
            .saved_participants
            .into_iter()
            .map(|p| (p.name, p.email))
            .collect();
    }
    for (index, (name, email)) in pairs.iter().enumerate() {
        let id = if index == 0 {
            form.participants()[0].id
        } else {
            form.add_participant()
        };
        form.update_participant(id, ParticipantField::Name, name);
        form.update_participant(id, ParticipantField::Email, email);
    }

    let events = state.event_bus.subscribe();
    let done = CancellationToken::new();
    let printer = tokio::spawn(relay_progress(events, done.clone(), |line| println!("{}", line)));

    let processor = state.processor.clone();
    let outcome = tokio::select! {
        outcome = processor.process(&form) => outcome,
        _ = tokio::signal::ctrl_c() => {
            state.processor.reset();
            Ok(PollOutcome::Cancelled)
        }
    };
    done.cancel();
    printer.await?;

    match outcome? {
        PollOutcome::Completed { meeting, .. } => {
            println!("Processed meeting {} \"{}\"", meeting.id, meeting.title);
            Ok(())
        }
        PollOutcome::Failed { message, .. } => bail!("{}", message),
        PollOutcome::Cancelled => {
            println!("Cancelled");
            Ok(())
        }
    }
}

fn progress_line(event: &AlexEvent) -> Option<String> {
    match event {
        AlexEvent::SubmissionStarted { title, .. } => Some(format!("Uploading \"{}\"...", title)),
        AlexEvent::JobStatusChanged {
            meeting_id,
            status,
            progress,
            ..
        } => Some(format!("Meeting {}: {} ({}%)", meeting_id, status, progress)),
        AlexEvent::NavigationRequested { path, .. } => Some(format!("Ready: {}", path)),
        _ => None,
    }
}

/// Print workflow progress until `done` fires, then flush what is queued
async fn relay_progress<F>(
    mut events: broadcast::Receiver<AlexEvent>,
    done: CancellationToken,
    mut emit: F,
) where
    F: FnMut(String),
{
    loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(line) = progress_line(&event) {
                        emit(line);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return,
            },
            _ = done.cancelled() => break,
        }
    }

    loop {
        match events.try_recv() {
            Ok(event) => {
                if let Some(line) = progress_line(&event) {
                    emit(line);
                }
            }
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
}

async fn action_items(state: &AppState, filter: ActionItemFilter) -> Result<()> {
    let meetings = state.queries.meetings().await.map_err(query_failed)?;
    let board = ActionItemBoard::from_meetings(&meetings);
    let now = Utc::now();

    for entry in board.filtered(&filter, now) {
        let mark = if entry.is_done() { "x" } else { " " };
        println!(
            "[{}] {}  {}  due {}  ({} #{})",
            mark,
            entry.item.description,
            entry.item.owner.as_deref().unwrap_or("unassigned"),
            entry.item.due_date.as_deref().unwrap_or("-"),
            entry.meeting_title,
            entry.meeting_id
        );
    }

    let stats = board.stats(now);
    println!(
        "\n{} total, {} completed, {} pending, {} overdue",
        stats.total, stats.completed, stats.pending, stats.overdue
    );
    Ok(())
}

async fn meeting_history(state: &AppState, filter: HistoryFilter) -> Result<()> {
    let meetings = state.queries.meetings().await.map_err(query_failed)?;
    let found = filter.apply(&meetings);

    found.iter().for_each(|m| print_meeting_row(m));
    println!(
        "\n{} of {} meetings. Sources: {}",
        found.len(),
        meetings.len(),
        history::sources(&meetings).join(", ")
    );
    Ok(())
}

async fn show_dashboard(state: &AppState) -> Result<()> {
    let meetings = state.queries.meetings().await.map_err(query_failed)?;
    let stats = dashboard::dashboard_stats(&meetings);

    println!("Meetings:            {}", stats.total_meetings);
    println!("Action items:        {}", stats.total_action_items);
    println!("Pending action items {}", stats.pending_action_items);
    println!("\nRecent meetings:");
    dashboard::recent_meetings(&meetings)
        .iter()
        .for_each(print_meeting_row);
    Ok(())
}

async fn run_followup(
    state: &AppState,
    transcript: Option<String>,
    file: Option<PathBuf>,
    dictate: bool,
) -> Result<()> {
    let transcript = match (transcript, file) {
        _ if dictate => {
            let mut session = DictationSession::new(None);
            session.start();
            session.finish()?
        }
        (Some(text), _) => text,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => String::new(),
    };

    let response = dashboard::run_followup(state.api(), &transcript).await?;
    println!("{}\n", response.summary.trim());
    for item in &response.action_items {
        println!(
            "- {} ({}, due {})",
            item.description,
            item.owner.as_deref().unwrap_or("unassigned"),
            item.due_date.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn theme(value: Option<String>) -> Result<()> {
    let store = PreferencesStore::default_location()?;
    let mut prefs = store.load();

    let theme = match value.as_deref() {
        None => prefs.effective_theme(),
        Some("toggle") => prefs.toggle_theme(),
        Some(raw) => {
            let theme: Theme = raw.parse()?;
            prefs.theme = Some(theme);
            theme
        }
    };
    if value.is_some() {
        store.persist(&prefs)?;
    }
    println!("{}", theme);
    Ok(())
}

fn participants(action: ParticipantsAction) -> Result<()> {
    let store = PreferencesStore::default_location()?;
    let mut prefs = store.load();

    match action {
        ParticipantsAction::List => {
            for p in &prefs.saved_participants {
                println!("{}  {} <{}>", p.id, p.name, p.email);
            }
        }
        ParticipantsAction::Add { name, email } => {
            let saved = prefs.add_participant(&name, &email)?;
            store.persist(&prefs)?;
            println!("Saved {} ({})", saved.name, saved.id);
        }
        ParticipantsAction::Remove { id } => {
            if !prefs.remove_participant(id) {
                bail!("No saved participant {}", id);
            }
            store.persist(&prefs)?;
            println!("Removed {}", id);
        }
    }
    Ok(())
}
