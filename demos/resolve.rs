//! Resolve the solution below a directory and print what would be built.
//!
//! ```text
//! cargo run --example resolve -- [DIR] [CONFIGURATION] [PLATFORMS]
//! RUST_LOG=msproj_rs=debug cargo run --example resolve -- src Debug "AnyCPU;x64"
//! ```

use anyhow::Context;
use msproj_rs::{BuildRequest, Platform};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let dir = args.next().unwrap_or_else(|| ".".to_string());
    let configuration = args.next();
    let platforms = args
        .next()
        .map(|list| Platform::parse_list(&list))
        .transpose()
        .context("invalid platform list")?;

    let mut builder = BuildRequest::builder().working_dir(&dir);
    if let Some(configuration) = configuration {
        builder = builder.configuration(configuration);
    }
    if let Some(platforms) = platforms {
        builder = builder.platforms(platforms);
    }
    let request = builder.build();

    let preprocessor = request.detect_preprocessor();
    let config = msproj_rs::resolve(&request, preprocessor.as_ref())
        .with_context(|| format!("failed to resolve projects below {dir}"))?;

    println!("configuration: {}", config.configuration());
    if let Some(solution) = config.solution() {
        println!("solution:      {}", solution.display());
    }
    for (platform, projects) in config.projects_by_platform().iter() {
        println!("{platform}");
        for project in projects {
            let model = project.project();
            println!(
                "  {:<30} {:<8} {}",
                model.assembly_name,
                model.output_type,
                project.output_dir().display()
            );
        }
    }
    Ok(())
}
