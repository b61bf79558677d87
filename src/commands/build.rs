//! Build command implementation
//!
//! Merges command line arguments over an optional project file, turns the
//! result into a [`BuildRequest`] and hands it to the [`BundleBuilder`] with
//! the chosen dependency resolver.

use std::path::PathBuf;

use console::Style;

use crate::bundle::{BuildRequest, BundleArtifact, BundleBuilder, IncludeSpec, ScriptSpec};
use crate::cli::{BuildArgs, ResolverKind};
use crate::config::project::ProjectScripts;
use crate::config::{ChubProject, EntryReference};
use crate::error::{ChubError, Result};
use crate::resolver::{DependencyResolver, NoResolver, PipResolver};

/// Run build command
pub fn run(args: BuildArgs) -> Result<()> {
    let project = match &args.chubproject {
        Some(path) => ChubProject::load(path)?,
        None => ChubProject::default(),
    }
    .override_with(project_from_args(&args)?);

    if let Some(path) = &args.chubproject_save {
        project.save(path)?;
        if !args.quiet {
            println!(
                "{} build options to {}",
                Style::new().green().bold().apply_to("Saved"),
                path.display()
            );
        }
    }

    let request = build_request(&project)?;
    let output = match &project.chub {
        Some(path) => PathBuf::from(path),
        None => BundleBuilder::default_output(&request)?,
    };

    let pip;
    let resolver: &dyn DependencyResolver = match args.resolver {
        ResolverKind::Pip => {
            pip = PipResolver::new(&args.python);
            &pip
        }
        ResolverKind::None => &NoResolver,
    };

    let artifact = BundleBuilder::new(resolver)
        .with_progress(!args.quiet)
        .build(&request, &output, None)?;

    if !args.quiet {
        print_summary(&artifact, args.verbose);
    }
    Ok(())
}

/// The build options given on the command line
fn project_from_args(args: &BuildArgs) -> Result<ChubProject> {
    let path = |p: &PathBuf| p.display().to_string();
    let mut project = ChubProject {
        wheel: args.wheel.as_ref().map(path),
        chub: args.chub.as_ref().map(path),
        entrypoint: args.entrypoint.clone(),
        includes: args.includes.clone(),
        scripts: ProjectScripts {
            pre: args.pre_scripts.iter().map(path).collect(),
            post: args.scripts.iter().map(path).collect(),
        },
        ..ChubProject::default()
    };
    for entry in &args.metadata {
        let (key, value) = BuildRequest::parse_metadata_entry(entry)?;
        project.metadata.insert(key, value);
    }
    Ok(project)
}

fn build_request(project: &ChubProject) -> Result<BuildRequest> {
    let wheel = project.wheel.as_deref().ok_or(ChubError::NoWheel)?;
    let mut request = BuildRequest::new(wheel);
    request.entrypoint = project
        .entrypoint
        .as_deref()
        .map(EntryReference::parse)
        .transpose()?;
    request.includes = project.includes.iter().map(|i| IncludeSpec::parse(i)).collect();
    request.scripts = project
        .scripts
        .pre
        .iter()
        .map(ScriptSpec::pre)
        .chain(project.scripts.post.iter().map(ScriptSpec::post))
        .collect();
    request.metadata = project.metadata.clone();
    Ok(request)
}

fn print_summary(artifact: &BundleArtifact, verbose: bool) {
    println!(
        "{} {} into {} ({} package(s) in bundle)",
        Style::new().green().bold().apply_to("Bundled"),
        Style::new().bold().yellow().apply_to(artifact.unit.unit_dir()),
        artifact.path.display(),
        artifact.unit_count
    );
    if verbose {
        println!("{}", artifact.layout);
    }
}
