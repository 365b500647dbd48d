//! Command implementations for the CLI interface.
//!
//! Each handler maps one subcommand onto a core operation against the open
//! [`Session`] and prints a plain-text result to stdout.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};
use uuid::Uuid;

use crate::error::{Result, TrackerError, ValidationError};
use crate::fields::*;
use crate::instantiate::{create_project_from_template, ProjectCreatePayload};
use crate::progress::compute_progress;
use crate::project::{Project, QuotedHours};
use crate::review::ProjectChangeSummary;
use crate::session::Session;
use crate::stats::{historical_stats, is_stalled};
use crate::task::{NewTask, Task};
use crate::template::{Assignee, TemplateDraft};

#[derive(Subcommand)]
pub enum Commands {
    /// List projects with progress and blocked state.
    Projects {
        /// Include closed projects.
        #[arg(long)]
        all: bool,
    },

    /// Show a project: tasks by milestone, review notes, hours against quote.
    Show {
        /// Project id, id prefix, or name.
        project: String,
    },

    /// Create a project and seed its tasks from the template library.
    New {
        /// Project name.
        name: String,
        #[arg(long)]
        customer: String,
        /// Work order number.
        #[arg(long = "work-order")]
        work_order: String,
        /// Order date: YYYY-MM-DD (default today).
        #[arg(long)]
        order_date: Option<NaiveDate>,
        /// Project type; selects which templates apply.
        #[arg(long = "type", value_enum)]
        project_type: ProjectType,
        #[arg(long, value_enum, default_value_t = LeadTimeType::Standard)]
        lead_time: LeadTimeType,
        /// Owning user id or initials (default: the acting user).
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        reseller: Option<String>,
        /// Scale dealer.
        #[arg(long)]
        dealer: Option<String>,
        /// Quoted hours as CATEGORY=HOURS, e.g. pm-time=6. May be repeated.
        #[arg(long = "quote", value_parser = parse_quote)]
        quotes: Vec<(TimeCategory, f64)>,
    },

    /// Work with a project's tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Work with a project's review notes.
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },

    /// Summarize changes on open projects since the last review.
    Review {
        /// Measure from this date instead of the review cursor.
        #[arg(long)]
        since: Option<NaiveDate>,
        #[command(subcommand)]
        action: Option<ReviewAction>,
    },

    /// Close a project.
    Close { project: String },

    /// Reopen a closed project.
    Reopen { project: String },

    /// Manage task templates.
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Manage the phase list tasks and templates are grouped under.
    Phase {
        #[command(subcommand)]
        action: PhaseAction,
    },

    /// Historical actual hours for tasks like the given one.
    Estimate {
        /// Task title to match (containment either way, case-insensitive).
        title: String,
        /// Also match finished tasks in this category.
        #[arg(long, value_enum)]
        category: Option<TaskCategory>,
    },

    /// List users.
    Users,

    /// List departments.
    Departments,

    /// List statuses, categories, project types and phases.
    Catalog,

    /// Deliver pending store writes now and report failures.
    Flush {
        /// Discard writes that have exhausted their retries instead of keeping them for the next run.
        #[arg(long)]
        drop_failed: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Set a task's status.
    Status {
        project: String,
        task: String,
        #[arg(value_enum)]
        status: TaskStatus,
    },
    /// Log time against a task.
    Time {
        project: String,
        task: String,
        hours: f64,
        /// Time category: label or kebab-case name.
        #[arg(long, value_parser = parse_time_category)]
        category: TimeCategory,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Comment on a task.
    Comment {
        project: String,
        task: String,
        text: String,
    },
    /// Add an ad-hoc task.
    Add {
        project: String,
        title: String,
        /// Checkpoint: 20, 40, 60, 80, 90 or 100.
        #[arg(long, default_value = "100")]
        milestone: Milestone,
        #[arg(long, value_enum, default_value_t = TaskCategory::PunchList)]
        category: TaskCategory,
        #[arg(long)]
        phase: Option<String>,
        /// Owner (default: project owner).
        #[arg(long)]
        owner: Option<String>,
        #[arg(long, default_value_t = 1.0)]
        hours: f64,
        /// Parent task; the new task inherits its milestone, phase and category.
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, value_enum, default_value_t = TaskStatus::Backlog)]
        status: TaskStatus,
    },
}

#[derive(Subcommand)]
pub enum NoteAction {
    /// Add a review note to a project.
    Add { project: String, text: String },
    /// Mark a note reviewed.
    Review { project: String, note: String },
    /// Turn a note into a punch-list task.
    Convert { project: String, note: String },
}

#[derive(Subcommand)]
pub enum ReviewAction {
    /// Snapshot every project's progress and move the cursor to now.
    Close,
}

#[derive(Subcommand)]
pub enum PhaseAction {
    /// List phases in order.
    List,
    /// Append a phase.
    Add { name: String },
    /// Remove a phase.
    Rm { name: String },
    /// Set the order; every phase must be named once.
    Order {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum TemplateAction {
    /// List templates.
    List {
        /// Only templates for this project type.
        #[arg(long = "type", value_enum)]
        project_type: Option<ProjectType>,
    },
    /// Create a template.
    Add {
        title: String,
        /// Project types it applies to. May be repeated.
        #[arg(long = "type", value_enum, required = true)]
        project_types: Vec<ProjectType>,
        #[arg(long)]
        milestone: Milestone,
        #[arg(long, value_enum)]
        category: TaskCategory,
        #[arg(long)]
        phase: Option<String>,
        #[arg(long, default_value_t = 1.0)]
        hours: f64,
        /// User id, or "owner" for whoever owns the project.
        #[arg(long, default_value = "owner", value_parser = parse_assignee)]
        assignee: Assignee,
        #[arg(long)]
        department: Option<String>,
    },
    /// Change fields of an existing template.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// Replace the project types. May be repeated.
        #[arg(long = "type", value_enum)]
        project_types: Vec<ProjectType>,
        #[arg(long)]
        milestone: Option<Milestone>,
        #[arg(long, value_enum)]
        category: Option<TaskCategory>,
        #[arg(long)]
        phase: Option<String>,
        #[arg(long)]
        hours: Option<f64>,
        #[arg(long, value_parser = parse_assignee)]
        assignee: Option<Assignee>,
    },
    /// Delete a template.
    Rm { id: String },
    /// Add a subtask blueprint to a template.
    Subtask {
        id: String,
        title: String,
        #[arg(long, default_value_t = 1.0)]
        hours: f64,
        #[arg(long, default_value = "owner", value_parser = parse_assignee)]
        assignee: Assignee,
    },
}

fn parse_time_category(s: &str) -> std::result::Result<TimeCategory, String> {
    TimeCategory::parse(s).map_err(|e| e.to_string())
}

fn parse_quote(s: &str) -> std::result::Result<(TimeCategory, f64), String> {
    let (cat, hours) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=HOURS, got '{s}'"))?;
    let hours: f64 = hours
        .trim()
        .parse()
        .map_err(|_| format!("invalid hours '{}'", hours.trim()))?;
    Ok((parse_time_category(cat)?, hours))
}

fn parse_assignee(s: &str) -> std::result::Result<Assignee, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("assignee cannot be empty".into());
    }
    if s.eq_ignore_ascii_case("owner") {
        return Ok(Assignee::ProjectOwner);
    }
    Ok(Assignee::from(s.to_string()))
}

/// First eight characters of an id; enough to resolve as a prefix.
pub fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

fn percent(value: u8) -> String {
    format!("{value}%")
}

/// List projects with progress.
pub fn cmd_projects(s: &Session, all: bool) {
    let now = Utc::now();
    let projects: Vec<&Project> = s
        .repo
        .projects()
        .iter()
        .filter(|p| all || p.is_open())
        .collect();
    if projects.is_empty() {
        println!("No projects.");
        return;
    }
    println!(
        "{:<9} {:<28} {:<20} {:<6} {:<14} {:<5} {}",
        "ID", "Name", "Customer", "Owner", "Type", "Prog", "Flags"
    );
    for p in projects {
        let mut flags = Vec::new();
        if p.has_blocked_tasks() {
            flags.push("blocked");
        }
        if is_stalled(p, s.settings.stall_days, now) {
            flags.push("stalled");
        }
        if !p.is_open() {
            flags.push("closed");
        }
        println!(
            "{:<9} {:<28} {:<20} {:<6} {:<14} {:<5} {}",
            short_id(p.id),
            truncate(&p.name, 28),
            truncate(&p.customer, 20),
            truncate(&p.owner, 6),
            p.kind.label(),
            percent(compute_progress(p)),
            flags.join(",")
        );
    }
}

fn print_task_row(t: &Task, indent: usize) {
    println!(
        "  {:<9} {:<11} {:<6} {:>6.1} {:>6.1}  {}{}",
        short_id(t.id),
        t.status.label(),
        truncate(&t.owner, 6),
        t.estimated_hours,
        t.logged_hours(),
        "  ".repeat(indent),
        t.title
    );
}

/// Show project detail.
pub fn cmd_show(s: &Session, query: &str) -> Result<()> {
    let pid = s.repo.resolve_project(query)?;
    let p = s.repo.project(pid)?;

    println!("{} [{}]", p.name, p.id);
    println!("Customer:    {}", p.customer);
    println!("Work order:  {}  (ordered {})", p.work_order_id, p.order_date);
    println!("Owner:       {}", p.owner);
    println!("Type:        {}  lead time {:?}", p.kind.label(), p.lead_time_type);
    if let Some(r) = &p.reseller {
        println!("Reseller:    {r}");
    }
    if let Some(d) = &p.scale_dealer {
        println!("Dealer:      {d}");
    }
    let mut status = format!("{:?}", p.status);
    if let Some(at) = p.closed_at {
        status.push_str(&format!(" on {}", at.date_naive()));
    }
    if p.has_blocked_tasks() {
        status.push_str(", blocked");
    }
    if is_stalled(p, s.settings.stall_days, Utc::now()) {
        status.push_str(", stalled");
    }
    println!("Status:      {status}");
    println!("Progress:    {}", percent(compute_progress(p)));

    for milestone in Milestone::ALL {
        let top: Vec<&Task> = p
            .tasks
            .iter()
            .filter(|t| t.milestone == milestone && !t.is_subtask())
            .collect();
        if top.is_empty() {
            continue;
        }
        let done = p
            .tasks
            .iter()
            .filter(|t| t.milestone == milestone && t.status.is_closed())
            .count();
        let total = p.tasks.iter().filter(|t| t.milestone == milestone).count();
        println!();
        println!("{} ({done}/{total} closed)", milestone);
        println!(
            "  {:<9} {:<11} {:<6} {:>6} {:>6}  {}",
            "ID", "Status", "Owner", "Est", "Actual", "Title"
        );
        for t in top {
            print_task_row(t, 0);
            for child in p.subtasks_of(t.id) {
                print_task_row(child, 1);
            }
        }
    }

    if !p.review_notes.is_empty() {
        println!();
        println!("Review notes ({} unreviewed)", p.unreviewed_notes());
        for n in &p.review_notes {
            let mark = if n.is_reviewed { "x" } else { " " };
            println!(
                "  [{mark}] {:<9} {} {:<4} {}",
                short_id(n.id),
                n.created_at.date_naive(),
                n.created_by,
                n.text
            );
        }
    }

    let lines = p.hours_vs_quote();
    if !lines.is_empty() {
        println!();
        println!("  {:<34} {:>7} {:>7}", "Hours", "Quoted", "Actual");
        for l in &lines {
            println!("  {:<34} {:>7.1} {:>7.1}", l.category.label(), l.quoted, l.actual);
        }
        let quoted: f64 = lines.iter().map(|l| l.quoted).sum();
        println!("  {:<34} {:>7.1} {:>7.1}", "Total", quoted, p.logged_hours());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_new(
    s: &mut Session,
    name: String,
    customer: String,
    work_order: String,
    order_date: Option<NaiveDate>,
    project_type: ProjectType,
    lead_time: LeadTimeType,
    owner: Option<String>,
    reseller: Option<String>,
    dealer: Option<String>,
    quotes: Vec<(TimeCategory, f64)>,
) -> Result<()> {
    let owner = match owner {
        Some(o) => o,
        None => s.actor()?.id,
    };
    let payload = ProjectCreatePayload {
        name,
        customer,
        work_order_id: work_order,
        order_date: order_date.unwrap_or_else(|| Utc::now().date_naive()),
        project_type,
        lead_time_type: lead_time,
        owner,
        reseller,
        scale_dealer: dealer,
        quoted_hours: quotes.into_iter().collect::<QuotedHours>(),
    };
    let id = create_project_from_template(&mut s.repo, &s.templates, &s.reference, payload)?;
    let p = s.repo.project(id)?;
    println!(
        "Created project {} ({}) with {} tasks",
        short_id(id),
        p.name,
        p.tasks.len()
    );
    Ok(())
}

pub fn cmd_task(s: &mut Session, action: TaskAction) -> Result<()> {
    match action {
        TaskAction::Status { project, task, status } => {
            let pid = s.repo.resolve_project(&project)?;
            let tid = s.repo.resolve_task(pid, &task)?;
            s.repo.set_task_status(pid, tid, status)?;
            let p = s.repo.project(pid)?;
            println!(
                "Task {} is now {}; project at {}{}",
                short_id(tid),
                status.label(),
                percent(compute_progress(p)),
                if p.blocked { " (blocked)" } else { "" }
            );
        }
        TaskAction::Time { project, task, hours, category, note } => {
            let actor = s.actor()?;
            let pid = s.repo.resolve_project(&project)?;
            let tid = s.repo.resolve_task(pid, &task)?;
            s.repo.add_time_entry(pid, tid, hours, category, &note, &actor)?;
            println!("Logged {hours:.1}h of {} on {}", category.label(), short_id(tid));
        }
        TaskAction::Comment { project, task, text } => {
            let actor = s.actor()?;
            let pid = s.repo.resolve_project(&project)?;
            let tid = s.repo.resolve_task(pid, &task)?;
            s.repo.add_comment(pid, tid, &text, &actor)?;
            println!("Comment added.");
        }
        TaskAction::Add {
            project,
            title,
            milestone,
            category,
            phase,
            owner,
            hours,
            parent,
            status,
        } => {
            let phase = phase.map(|p| s.phases.require(&p)).transpose()?;
            let pid = s.repo.resolve_project(&project)?;
            let parent_task_id = parent
                .map(|q| s.repo.resolve_task(pid, &q))
                .transpose()?;
            let owner = match owner {
                Some(o) => s.reference.require_user(&o)?.initials.to_uppercase(),
                None => s.repo.project(pid)?.owner.clone(),
            };
            let id = s.repo.create_task(
                pid,
                NewTask {
                    title,
                    owner,
                    parent_task_id,
                    department_id: None,
                    status,
                    phase,
                    milestone,
                    category,
                    estimated_hours: hours,
                },
            )?;
            println!("Added task {}", short_id(id));
        }
    }
    Ok(())
}

pub fn cmd_note(s: &mut Session, action: NoteAction) -> Result<()> {
    let actor = s.actor()?;
    match action {
        NoteAction::Add { project, text } => {
            let pid = s.repo.resolve_project(&project)?;
            let id = s.repo.add_review_note(pid, &text, &actor)?;
            println!("Added note {}", short_id(id));
        }
        NoteAction::Review { project, note } => {
            let pid = s.repo.resolve_project(&project)?;
            let nid = s.repo.resolve_note(pid, &note)?;
            if s.repo.mark_note_reviewed(pid, nid, &actor)? {
                println!("Note {} marked reviewed.", short_id(nid));
            } else {
                println!("Note {} was already reviewed.", short_id(nid));
            }
        }
        NoteAction::Convert { project, note } => {
            let pid = s.repo.resolve_project(&project)?;
            let nid = s.repo.resolve_note(pid, &note)?;
            let tid = s.repo.convert_note_to_task(pid, nid, &actor)?;
            println!("Note {} converted to punch-list task {}", short_id(nid), short_id(tid));
        }
    }
    Ok(())
}

fn print_summary(sum: &ProjectChangeSummary) {
    println!(
        "{:<9} {:<28} {:>4} -> {:<4} {:>+4} {:>5} {:>5} {:>5} {:<7} {}",
        short_id(sum.project_id),
        truncate(&sum.project_name, 28),
        percent(sum.previous_progress),
        percent(sum.current_progress),
        sum.progress_change,
        sum.tasks_added,
        sum.tasks_completed,
        sum.tasks_reopened,
        if sum.has_blocked_tasks { "yes" } else { "" },
        sum.unreviewed_notes
    );
}

pub fn cmd_review(s: &mut Session, since: Option<NaiveDate>, action: Option<ReviewAction>) -> Result<()> {
    if let Some(ReviewAction::Close) = action {
        let n = s.cursor.close_cycle(&s.repo);
        println!("Review cycle closed; snapshotted {n} projects.");
        return Ok(());
    }

    let since = since
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc());
    let from = since.unwrap_or(s.cursor.last_review);
    println!("Changes since {}", from.format("%Y-%m-%d %H:%M"));
    let summaries = s.cursor.summaries(&s.repo, since);
    if summaries.is_empty() {
        println!("No open projects.");
    } else {
        println!(
            "{:<9} {:<28} {:>12} {:>4} {:>5} {:>5} {:>5} {:<7} {}",
            "ID", "Name", "Progress", "Chg", "Added", "Done", "Reopn", "Blocked", "Notes"
        );
        for sum in &summaries {
            print_summary(sum);
        }
    }

    let closed = s.cursor.closed_since(&s.repo);
    if !closed.is_empty() {
        println!();
        println!("Closed since last review:");
        for p in closed {
            println!("  {:<9} {}", short_id(p.id), p.name);
        }
    }
    Ok(())
}

pub fn cmd_close(s: &mut Session, project: &str) -> Result<()> {
    let pid = s.repo.resolve_project(project)?;
    s.repo.close_project(pid)?;
    println!("Closed {}", short_id(pid));
    Ok(())
}

pub fn cmd_reopen(s: &mut Session, project: &str) -> Result<()> {
    let pid = s.repo.resolve_project(project)?;
    s.repo.reopen_project(pid)?;
    println!("Reopened {}", short_id(pid));
    Ok(())
}

/// Handle template management commands.
pub fn cmd_template(s: &mut Session, action: TemplateAction) -> Result<()> {
    match action {
        TemplateAction::List { project_type } => {
            let templates = match project_type {
                Some(pt) => s.templates.for_project_type(pt),
                None => {
                    let mut all = s.templates.list();
                    all.sort_by_key(|t| (t.milestone, t.order));
                    all
                }
            };
            println!(
                "{:<12} {:<5} {:<3} {:<14} {:>5} {:<16} {}",
                "ID", "Mile", "Ord", "Category", "Hours", "Assignee", "Title"
            );
            for t in templates {
                let assignee: String = t.assignee.clone().into();
                println!(
                    "{:<12} {:<5} {:<3} {:<14} {:>5.1} {:<16} {} [{}]",
                    truncate(&t.id, 12),
                    t.milestone.to_string(),
                    t.order,
                    t.category.label(),
                    t.estimated_hours,
                    assignee,
                    t.title,
                    t.project_types
                        .iter()
                        .map(|pt| pt.label())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                for st in t.ordered_subtasks() {
                    println!("{:<41} {:>5.1} {:<16}   - {}", "", st.estimated_hours, String::from(st.assignee.clone()), st.title);
                }
            }
        }
        TemplateAction::Add {
            title,
            project_types,
            milestone,
            category,
            phase,
            hours,
            assignee,
            department,
        } => {
            let phase = phase.map(|p| s.phases.require(&p)).transpose()?;
            let t = s.templates.create(TemplateDraft {
                title,
                project_types,
                phase,
                milestone,
                category,
                estimated_hours: hours,
                assignee,
                department_id: department,
            })?;
            println!("Created template {} at {} (order {})", t.id, t.milestone, t.order);
        }
        TemplateAction::Edit {
            id,
            title,
            project_types,
            milestone,
            category,
            phase,
            hours,
            assignee,
        } => {
            let mut t = s
                .templates
                .get(&id)
                .ok_or_else(|| TrackerError::not_found("template", &id))?;
            if let Some(title) = title {
                if title.trim().is_empty() {
                    return Err(ValidationError::Empty("template title").into());
                }
                t.title = title.trim().to_string();
            }
            if !project_types.is_empty() {
                t.project_types = project_types;
            }
            if let Some(m) = milestone.filter(|m| *m != t.milestone) {
                t.order = s.templates.next_order(m);
                t.milestone = m;
            }
            if let Some(c) = category {
                t.category = c;
            }
            if let Some(p) = phase {
                t.phase = if p.trim().is_empty() {
                    None
                } else {
                    Some(s.phases.require(&p)?)
                };
            }
            if let Some(h) = hours {
                if h < 0.0 || h.is_nan() {
                    return Err(ValidationError::Negative { field: "estimated hours", value: h }.into());
                }
                t.estimated_hours = h;
            }
            if let Some(a) = assignee {
                t.assignee = a;
            }
            s.templates.put(t);
            println!("Updated template {id}");
        }
        TemplateAction::Rm { id } => {
            let t = s.templates.delete(&id)?;
            println!("Deleted template {} ({})", t.id, t.title);
        }
        TemplateAction::Subtask { id, title, hours, assignee } => {
            let st = s.templates.add_subtask(&id, &title, hours, assignee)?;
            println!("Added subtask {} to {}", st.id, id);
        }
    }
    Ok(())
}

pub fn cmd_phase(s: &mut Session, action: PhaseAction) -> Result<()> {
    match action {
        PhaseAction::List => {
            for (i, phase) in s.phases.list().iter().enumerate() {
                println!("{:>2}. {phase}", i + 1);
            }
        }
        PhaseAction::Add { name } => {
            if s.phases.add(&name)? {
                println!("Added phase '{}'", name.trim());
            } else {
                println!("Phase '{}' already exists.", name.trim());
            }
        }
        PhaseAction::Rm { name } => {
            if s.phases.remove(&name) {
                println!("Removed phase '{}'", name.trim());
            } else {
                println!("No phase named '{}'.", name.trim());
            }
        }
        PhaseAction::Order { names } => {
            s.phases.reorder(&names)?;
            println!("Phases: {}", s.phases.list().join(", "));
        }
    }
    Ok(())
}

pub fn cmd_estimate(s: &Session, title: &str, category: Option<TaskCategory>) {
    match historical_stats(s.repo.projects(), title, category) {
        Some(st) => println!(
            "{} finished tasks: avg {:.1}h, min {:.1}h, max {:.1}h",
            st.task_count, st.avg_hours, st.min_hours, st.max_hours
        ),
        None => println!("No finished tasks with logged time match '{title}'."),
    }
}

pub fn cmd_users(s: &Session) {
    println!("{:<8} {:<5} {:<20} {:<12} {}", "ID", "Init", "Name", "Role", "Department");
    for u in s.reference.users() {
        let dept = u
            .department_id
            .as_deref()
            .and_then(|d| s.reference.department(d))
            .map(|d| d.name.as_str())
            .unwrap_or("-");
        let role = if s.reference.is_manager(&u.id) {
            format!("{}*", u.role.label())
        } else {
            u.role.label().to_string()
        };
        println!(
            "{:<8} {:<5} {:<20} {:<12} {}",
            u.id,
            u.initials,
            truncate(&u.name, 20),
            role,
            dept
        );
    }
}

pub fn cmd_departments(s: &Session) {
    println!("{:<12} {:<22} {:<6} {}", "ID", "Name", "Lead", "Members");
    for d in s.reference.departments() {
        let members: Vec<&str> = s
            .reference
            .users_in_department(&d.id)
            .map(|u| u.initials.as_str())
            .collect();
        println!(
            "{:<12} {:<22} {:<6} {}",
            d.id,
            truncate(&d.name, 22),
            d.lead.as_deref().unwrap_or("-"),
            members.join(", ")
        );
    }
}

pub fn cmd_catalog(s: &Session) {
    let r = &s.reference;
    let join = |labels: Vec<&str>| labels.join(", ");
    println!("Task statuses:   {}", join(r.task_statuses().iter().map(|v| v.label()).collect()));
    println!("Task categories: {}", join(r.task_categories().iter().map(|v| v.label()).collect()));
    println!("Time categories: {}", join(r.time_categories().iter().map(|v| v.label()).collect()));
    println!("Project types:   {}", join(r.project_types().iter().map(|v| v.label()).collect()));
    println!("Phases:          {}", join(s.phases.list().iter().map(String::as_str).collect()));
    let milestones: Vec<String> = Milestone::ALL.iter().map(|m| m.to_string()).collect();
    println!("Milestones:      {}", milestones.join(", "));
}

pub fn cmd_flush(s: &mut Session, drop_failed: bool) {
    let pending = s.repo.outbox().pending_len();
    let report = s.flush();
    println!(
        "Delivered {} of {} store writes, {} failed.",
        report.delivered, pending, report.failed
    );
    let failures = if drop_failed {
        s.repo.outbox_mut().take_failures()
    } else {
        s.repo.outbox().failures().to_vec()
    };
    for f in &failures {
        println!(
            "  {} after {} attempts at {}: {}",
            f.op.resource(),
            f.attempts,
            f.failed_at.format("%Y-%m-%d %H:%M:%S"),
            f.error
        );
    }
    if drop_failed && !failures.is_empty() {
        println!("Dropped {} failed writes.", failures.len());
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Run a subcommand against an open session.
pub fn dispatch(s: &mut Session, command: Commands) -> Result<()> {
    match command {
        Commands::Projects { all } => cmd_projects(s, all),
        Commands::Show { project } => cmd_show(s, &project)?,
        Commands::New {
            name,
            customer,
            work_order,
            order_date,
            project_type,
            lead_time,
            owner,
            reseller,
            dealer,
            quotes,
        } => cmd_new(
            s,
            name,
            customer,
            work_order,
            order_date,
            project_type,
            lead_time,
            owner,
            reseller,
            dealer,
            quotes,
        )?,
        Commands::Task { action } => cmd_task(s, action)?,
        Commands::Note { action } => cmd_note(s, action)?,
        Commands::Review { since, action } => cmd_review(s, since, action)?,
        Commands::Close { project } => cmd_close(s, &project)?,
        Commands::Reopen { project } => cmd_reopen(s, &project)?,
        Commands::Template { action } => cmd_template(s, action)?,
        Commands::Phase { action } => cmd_phase(s, action)?,
        Commands::Estimate { title, category } => cmd_estimate(s, &title, category),
        Commands::Users => cmd_users(s),
        Commands::Departments => cmd_departments(s),
        Commands::Catalog => cmd_catalog(s),
        Commands::Flush { drop_failed } => cmd_flush(s, drop_failed),
        Commands::Completions { shell } => cmd_completions(shell),
    }
    Ok(())
}
