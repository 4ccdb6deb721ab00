use anyhow::{bail, Context, Result};
use colored::Colorize;
use tracing::warn;
use opencv_installer::{
    Config, InstallOutcome, InstallReport, InstallRequest, Installer, Platform, PlatformDetector,
};
use crate::cli::CLI;

pub fn execute(cli: CLI) -> Result<()> {
    if cli.list_platforms {
        execute_list_platforms();
        return Ok(());
    }
    let version = cli
        .version
        .clone()
        .ok_or(anyhow::anyhow!("Missing required option: -v <version>"))?;
    execute_install(&cli, version)
}

pub fn execute_list_platforms() {
    for platform in Platform::all() {
        println!("{}", platform);
    }
}

pub fn execute_install(cli: &CLI, version: String) -> Result<()> {
    let config = Config::load().context("Could not load configuration")?;
    let platform = match cli.platform {
        Some(platform) => platform,
        None => PlatformDetector::new().detect()?,
    };

    let mut installer = Installer::from_config(&config, platform, version)?;
    if cli.platform.is_some() {
        installer = installer.with_platform(platform);
    }
    if cli.overwrite {
        installer = installer.overwrite_existing_files();
    }

    let requests: Vec<InstallRequest> = cli
        .selected()
        .into_iter()
        .map(|(kind, location)| InstallRequest {
            kind,
            location,
            overwrite: cli.overwrite,
        })
        .collect();
    if requests.is_empty() {
        warn!("No artifacts selected. Use --all or one of --java, --jni, --headers, --natives");
        return Ok(());
    }

    println!("Installing specified OpenCV {} components for {}", installer.version(), installer.platform());
    let reports = installer.install_all(&requests)?;
    print_summary(&reports);

    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    if failed > 0 {
        bail!("{} of {} artifact(s) failed to install", failed, reports.len());
    }
    Ok(())
}

fn print_summary(reports: &[InstallReport]) {
    println!("==========================");
    println!("Finished installing OpenCV");
    for report in reports {
        match &report.result {
            Ok(InstallOutcome::Installed { location, .. }) => {
                println!("  {} {} -> {}", "installed".green(), report.kind, location.display());
            }
            Ok(InstallOutcome::Skipped { location }) => {
                println!("  {} {} (already in {})", "skipped".yellow(), report.kind, location.display());
            }
            Err(failure) => {
                println!("  {} {}: {}", "failed".red(), report.kind, failure.error);
            }
        }
    }
}
