//! kiln's application entry point.
//! Parses arguments, prepares the generator context and rule table, then
//! hands both to the generator and prints its report.

use kiln::{
    cleanup::SERVER_MIGRATIONS,
    cli::{get_args, Args},
    context::load_context,
    error::{default_error_handler, Result},
    generator::Generator,
    logger::init_logger,
    renderer::MiniJinjaRenderer,
    rules::{loader::load_rules, server::server_rules},
    store::DirTemplateStore,
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Loads the generator context and applies `--set` overrides
/// 2. Loads and validates the rule table
/// 3. Runs the generator against the template directory
/// 4. Prints the cleanup and write reports
fn run(args: Args) -> Result<()> {
    let renderer = MiniJinjaRenderer::new();

    let mut context = load_context(args.context.as_deref(), args.stdin, &args.output_dir)?;
    for assignment in &args.overrides {
        context.apply_override(assignment)?;
    }

    let rules = match &args.rules {
        Some(path) => load_rules(path, &renderer)?,
        None => {
            let rules = server_rules();
            rules.validate(&renderer)?;
            rules
        }
    };
    let rules = rules.select(&args.groups)?;

    let store = DirTemplateStore::new(&args.templates)?;
    let generator = Generator::new(&rules, &store, &renderer)
        .with_policy(args.write_policy())
        .with_migrations(SERVER_MIGRATIONS)
        .skip_cleanup(args.skip_cleanup);

    let report = generator.run(&context, &args.output_dir)?;

    for path in &report.cleanup.removed {
        println!("remove: '{}'", path.display());
    }
    for entry in &report.written {
        println!("{}: '{}'", entry.action, entry.path.display());
    }

    let verb = if args.dry_run { "Dry run completed" } else { "Generation completed" };
    println!(
        "{} in {}: {} changed, {} unchanged, {} legacy paths removed.",
        verb,
        args.output_dir.display(),
        report.changed().count(),
        report.written.len() - report.changed().count(),
        report.cleanup.removed.len()
    );
    Ok(())
}
