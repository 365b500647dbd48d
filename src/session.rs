//! One command invocation's view of the data directory.
//!
//! Opening a session loads settings, the pending outbox, reference data, the
//! template library, the project working set and the review cursor. Closing it
//! flushes the outbox to the store and writes the local state files back.

use std::fs;

use tracing::{debug, warn};

use crate::config::{DataPaths, Settings};
use crate::db::{JsonStore, Resource};
use crate::error::{Result, ValidationError};
use crate::outbox::{FlushReport, Outbox};
use crate::phase::PhaseCatalog;
use crate::records::{self, to_value};
use crate::reference::{Actor, ReferenceData};
use crate::repo::ProjectRepository;
use crate::review::ReviewCursor;
use crate::template::TemplateLibrary;

pub struct Session {
    pub paths: DataPaths,
    pub settings: Settings,
    pub store: JsonStore,
    pub reference: ReferenceData,
    pub templates: TemplateLibrary,
    pub phases: PhaseCatalog,
    pub repo: ProjectRepository,
    pub cursor: ReviewCursor,
    actor: Option<String>,
}

impl Session {
    pub fn open(paths: DataPaths, actor: Option<String>) -> Result<Self> {
        fs::create_dir_all(&paths.root)?;
        let settings = Settings::load(&paths.root)?;
        let store = JsonStore::open(paths.store())?;
        let mut outbox = Outbox::load(&paths.outbox(), settings.retry_policy())?;

        let reference = match records::load_reference(&store) {
            Ok((reference, true)) => {
                debug!("record store has no users, seeding the default directory");
                outbox.insert(Resource::Users, reference.users().iter().map(to_value).collect());
                outbox.insert(
                    Resource::Departments,
                    reference.departments().iter().map(to_value).collect(),
                );
                reference
            }
            Ok((reference, false)) => reference,
            Err(e) => {
                warn!(error = %e, "could not load reference data, using the default directory");
                ReferenceData::seeded()
            }
        };

        let templates = TemplateLibrary::load(&paths.templates())?;
        let phases = PhaseCatalog::load(&paths.phases())?;
        let cursor = ReviewCursor::load(&paths.review(), settings.review.default_window_days)?;
        let mut repo = ProjectRepository::new(outbox);
        repo.load_from(&store);

        Ok(Session {
            paths,
            settings,
            store,
            reference,
            templates,
            phases,
            repo,
            cursor,
            actor,
        })
    }

    /// The acting user: `--actor`, else `default_actor`. Must be a known user.
    pub fn actor(&self) -> Result<Actor> {
        let id = self
            .actor
            .as_deref()
            .or(self.settings.default_actor.as_deref())
            .ok_or(ValidationError::Empty("actor (pass --actor or set default_actor)"))?;
        Ok(Actor::from(self.reference.require_user(id)?))
    }

    /// Deliver pending store writes. Failures stay in the outbox for the next run.
    pub fn flush(&mut self) -> FlushReport {
        self.repo.outbox_mut().flush(&mut self.store)
    }

    pub fn close(mut self) -> Result<FlushReport> {
        let report = self.flush();
        if report.failed > 0 {
            warn!(failed = report.failed, "some store writes failed and will be retried next run");
        }
        self.repo.outbox().save(&self.paths.outbox())?;
        self.templates.save(&self.paths.templates())?;
        self.phases.save(&self.paths.phases())?;
        self.cursor.save(&self.paths.review())?;
        Ok(report)
    }
}
