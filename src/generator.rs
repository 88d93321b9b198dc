//! Generation run orchestration.
//!
//! A run goes through fixed phases: context setup, planning (conditions,
//! path resolution, collision detection), materialization, cleanup and
//! finally writing. Everything that can reveal a broken rule table happens
//! before the first filesystem change.

use crate::cleanup::{CleanupPass, CleanupReport, CleanupRoots, MigrationStep};
use crate::condition;
use crate::context::GeneratorContext;
use crate::error::{Result, RuleLocation};
use crate::materializer::Materializer;
use crate::renderer::TemplateRenderer;
use crate::resolver::{self, DestinationRegistry};
use crate::rules::{InterpolatePattern, Mode, RuleTable};
use crate::store::TemplateStore;
use crate::writer::{WriteAction, WritePolicy, Writer};
use log::debug;
use std::path::{Path, PathBuf};

/// A file spec that survived its block condition, with resolved paths.
#[derive(Debug, Clone)]
pub struct PlannedFile {
    pub location: RuleLocation,
    pub source_id: String,
    pub dest_path: PathBuf,
    pub mode: Mode,
    pub pattern: InterpolatePattern,
}

#[derive(Debug, Clone)]
pub struct RenderedFile {
    pub planned: PlannedFile,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteEntry {
    pub action: WriteAction,
    pub path: PathBuf,
}

/// Ordered record of a run, suitable for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub cleanup: CleanupReport,
    pub written: Vec<WriteEntry>,
}

impl Report {
    /// Destinations whose content was (or, in dry-run, would be) written.
    pub fn changed(&self) -> impl Iterator<Item = &WriteEntry> {
        self.written
            .iter()
            .filter(|entry| matches!(entry.action, WriteAction::Create | WriteAction::Overwrite))
    }
}

pub struct Generator<'a> {
    rules: &'a RuleTable,
    store: &'a dyn TemplateStore,
    renderer: &'a dyn TemplateRenderer,
    migrations: &'a [MigrationStep],
    policy: WritePolicy,
    skip_cleanup: bool,
}

impl<'a> Generator<'a> {
    pub fn new(
        rules: &'a RuleTable,
        store: &'a dyn TemplateStore,
        renderer: &'a dyn TemplateRenderer,
    ) -> Self {
        Self {
            rules,
            store,
            renderer,
            migrations: &[],
            policy: WritePolicy::default(),
            skip_cleanup: false,
        }
    }

    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_migrations(mut self, migrations: &'a [MigrationStep]) -> Self {
        self.migrations = migrations;
        self
    }

    pub fn skip_cleanup(mut self, skip_cleanup: bool) -> Self {
        self.skip_cleanup = skip_cleanup;
        self
    }

    /// Walks the rule table and resolves every eligible file spec.
    ///
    /// # Errors
    /// * `Error::ConditionError` if a block condition fails
    /// * `Error::PathError` if a destination cannot be computed
    /// * `Error::DestinationCollision` if two specs share a destination
    pub fn plan(&self, context: &GeneratorContext) -> Result<Vec<PlannedFile>> {
        let mut registry = DestinationRegistry::new();
        let mut planned = Vec::new();

        for group in &self.rules.groups {
            for (index, block) in group.blocks.iter().enumerate() {
                let block_location = RuleLocation::block(&group.name, index);
                let eligible = condition::evaluate(
                    block.condition.as_ref(),
                    context,
                    self.renderer,
                    &block_location,
                )?;
                if !eligible {
                    debug!("Skipping {block_location}: condition is false");
                    continue;
                }

                for spec in &block.file_specs {
                    let location = block_location.clone().with_source(spec.source_id());
                    let (source_id, dest_path) = resolver::resolve(
                        spec,
                        block.base_path.as_deref(),
                        context,
                        self.renderer,
                        &location,
                    )?;
                    let location = location.with_dest(dest_path.display().to_string());
                    registry.register(&dest_path, &location)?;
                    planned.push(PlannedFile {
                        location,
                        source_id,
                        dest_path,
                        mode: spec.mode(),
                        pattern: spec.pattern().clone(),
                    });
                }
            }
        }

        debug!("Planned {} files", planned.len());
        Ok(planned)
    }

    /// Produces the content of every planned file.
    pub fn materialize(
        &self,
        plan: Vec<PlannedFile>,
        context: &GeneratorContext,
    ) -> Result<Vec<RenderedFile>> {
        let materializer = Materializer::new(self.store, self.renderer)?;
        let context_value = context.to_value();
        plan.into_iter()
            .map(|planned| {
                let content = materializer.materialize(
                    &planned.source_id,
                    planned.mode,
                    &planned.pattern,
                    &context_value,
                    &planned.location,
                )?;
                Ok(RenderedFile { planned, content })
            })
            .collect()
    }

    /// Runs a full generation into `output_dir`.
    pub fn run<P: AsRef<Path>>(&self, context: &GeneratorContext, output_dir: P) -> Result<Report> {
        let output_dir = output_dir.as_ref();
        let mut context = context.clone();
        context.setup();

        let plan = self.plan(&context)?;
        let rendered = self.materialize(plan, &context)?;

        let cleanup = if self.skip_cleanup {
            CleanupReport::default()
        } else {
            let roots = CleanupRoots::for_server(output_dir, &context);
            CleanupPass::new(self.migrations).dry_run(self.policy.dry_run).run(&context, &roots)?
        };

        let writer = Writer::new(output_dir, self.policy);
        let actions = rendered
            .iter()
            .map(|file| writer.decide(&file.planned.dest_path, &file.content))
            .collect::<Result<Vec<_>>>()?;

        let mut written = Vec::with_capacity(rendered.len());
        for (file, action) in rendered.iter().zip(actions) {
            writer.commit(&file.planned.dest_path, &file.content, action)?;
            debug!("{}: '{}'", action, file.planned.dest_path.display());
            written.push(WriteEntry { action, path: file.planned.dest_path.clone() });
        }

        Ok(Report { cleanup, written })
    }
}
