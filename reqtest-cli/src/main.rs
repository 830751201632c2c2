mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use colored::{ColoredString, Colorize};
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use reqtest_core::{
    export, get_config_path, Category, Checklist, Config, Extractor, Framework, Generator,
    GeneratorConfig, PytestRunner, Requirement, TestStatus,
};

use crate::cli::{Cli, Command, SubCommand};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let extractor = Extractor::new(config.extractor.clone())?;

    match &cli.command {
        Command::Extract { input, json } => {
            extract_requirements(&extractor, input.as_deref(), *json)?;
        }
        Command::Generate {
            input,
            framework,
            suite,
            from_checklist,
            output,
        } => {
            let generator_config =
                generator_config(&config.generator, framework.as_deref(), suite.as_deref())?;
            generate_tests(
                &extractor,
                generator_config,
                input.as_deref(),
                *from_checklist,
                output.as_deref(),
            )?;
        }
        Command::Checklist {
            input,
            json,
            output,
        } => {
            export_checklist(&extractor, input.as_deref(), *json, output.as_deref())?;
        }
        Command::Check {
            file,
            ids,
            all,
            uncheck,
        } => {
            check_requirements(file, ids, *all, *uncheck)?;
        }
        Command::Sub(sub_cmd) => {
            handle_sub_command(sub_cmd, &extractor)?;
        }
        Command::Run {
            file,
            python,
            timeout,
        } => {
            run_tests(file, python, *timeout, &config.generator)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// `--config` wins, then `REQTEST_CONFIG`, then `~/.reqtest.yaml`, then built-ins
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit.map(Path::to_path_buf).or_else(get_config_path) {
        Some(path) => {
            log::debug!("Loading config from {}", path.display());
            Ok(Config::load(&path)?)
        }
        None => Ok(Config::default()),
    }
}

fn generator_config(
    base: &GeneratorConfig,
    framework: Option<&str>,
    suite: Option<&str>,
) -> Result<GeneratorConfig> {
    let mut config = base.clone();
    if let Some(name) = framework {
        config.framework = name.parse::<Framework>().map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(name) = suite {
        config.suite_name = Some(name.to_string());
    }
    Ok(config.validated()?)
}

/// Reads the input file, or stdin when no file is given
fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => export::read_text(path),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read standard input")?;
            Ok(buffer)
        }
    }
}

fn category_label(category: Category) -> ColoredString {
    let label = format!("[{}]", category);
    match category {
        Category::Security => label.red(),
        Category::Validation => label.yellow(),
        Category::Input => label.cyan(),
        Category::Output => label.blue(),
        Category::Performance => label.magenta(),
        Category::Functional => label.green(),
    }
}

fn print_no_requirements_hint(extractor: &Extractor) {
    let examples: Vec<String> = extractor
        .config()
        .requirement_keywords
        .iter()
        .take(3)
        .map(|k| format!("'{}'", k))
        .collect();
    eprintln!(
        "{}",
        format!(
            "No requirements could be extracted from the text. Try including words like {}, etc.",
            examples.join(", ")
        )
        .yellow()
    );
}

fn print_requirement(req: &Requirement) {
    let mark = if req.checked { "[x]".green() } else { "[ ]".normal() };
    println!(
        "{}{} {} {} {}",
        "  ".repeat(req.depth()),
        mark,
        req.id.bold(),
        category_label(req.category),
        req.text
    );
}

fn extract_requirements(extractor: &Extractor, input: Option<&Path>, json: bool) -> Result<()> {
    let text = read_input(input)?;
    let checklist = Checklist::new(extractor.extract(&text));

    if json {
        println!("{}", export::to_json(&checklist)?);
        return Ok(());
    }

    if checklist.is_empty() {
        print_no_requirements_hint(extractor);
        return Ok(());
    }

    for req in checklist.flatten() {
        print_requirement(req);
    }
    println!("\n{}", checklist.summary());

    Ok(())
}

fn generate_tests(
    extractor: &Extractor,
    config: GeneratorConfig,
    input: Option<&Path>,
    from_checklist: bool,
    output: Option<&Path>,
) -> Result<()> {
    let text = read_input(input)?;
    let requirements = if from_checklist {
        // Either an exported checklist or its JSON form
        let checklist = if text.trim_start().starts_with('{') {
            export::from_json(&text)?
        } else {
            Checklist::parse(&text).context("Failed to parse checklist input")?
        };
        checklist.requirements
    } else {
        extractor.extract(&text)
    };

    if requirements.is_empty() {
        print_no_requirements_hint(extractor);
    }

    let generator = Generator::new(config);
    let code = generator.generate(&requirements);

    match output {
        Some(path) => {
            export::write_text(path, &code)?;
            println!(
                "{} {} ({} tests)",
                "Test code saved to".green(),
                path.display(),
                generator.entries(&requirements).len()
            );
        }
        None => print!("{}", code),
    }

    Ok(())
}

fn export_checklist(
    extractor: &Extractor,
    input: Option<&Path>,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    let text = read_input(input)?;
    let checklist = Checklist::new(extractor.extract(&text));

    if checklist.is_empty() {
        print_no_requirements_hint(extractor);
    }

    match (output, json) {
        (Some(path), true) => {
            export::export_json(&checklist, path)?;
            println!("{} {}", "Requirements exported to".green(), path.display());
        }
        (Some(path), false) => {
            export::export_checklist(&checklist, path)?;
            println!("{} {}", "Checklist exported to".green(), path.display());
        }
        (None, true) => println!("{}", export::to_json(&checklist)?),
        (None, false) => print!("{}", checklist.render()),
    }

    Ok(())
}

fn check_requirements(file: &Path, ids: &[String], all: bool, uncheck: bool) -> Result<()> {
    if ids.is_empty() && !all {
        anyhow::bail!("Specify requirement IDs or use --all");
    }

    let mut checklist = export::import_checklist(file)?;

    if all {
        if uncheck {
            checklist.uncheck_all();
        } else {
            checklist.check_all();
        }
    } else {
        for id in ids {
            checklist.set_checked(id, !uncheck)?;
        }
    }

    export::export_checklist(&checklist, file)?;

    for req in checklist.flatten() {
        print_requirement(req);
    }
    println!("\n{}", checklist.summary());

    Ok(())
}

fn handle_sub_command(cmd: &SubCommand, extractor: &Extractor) -> Result<()> {
    match cmd {
        SubCommand::Add { file, parent, text } => {
            let mut checklist = export::import_checklist(file)?;
            let id = checklist.add_sub_requirement(parent, text, extractor)?;
            export::export_checklist(&checklist, file)?;

            if let Some(req) = checklist.find(&id) {
                println!("{}", "Sub-requirement added successfully!".green());
                print_requirement(req);
            }
        }
        SubCommand::Remove {
            file,
            parent,
            index,
        } => {
            let position = index
                .checked_sub(1)
                .context("Sub-requirement positions start at 1")?;

            let mut checklist = export::import_checklist(file)?;
            let removed = checklist.remove_sub_requirement(parent, position)?;
            export::export_checklist(&checklist, file)?;

            println!("{} {}", "Removed:".green(), removed.text);
            if let Some(req) = checklist.find(parent) {
                for sub in &req.sub_requirements {
                    print_requirement(sub);
                }
            }
        }
    }
    Ok(())
}

fn status_marker(status: TestStatus) -> ColoredString {
    match status {
        TestStatus::Passed => "✓".green(),
        TestStatus::Failed => "✗".red(),
        TestStatus::Error => "!".yellow(),
        TestStatus::Skipped => "~".dimmed(),
    }
}

fn run_tests(file: &Path, python: &Path, timeout: u64, config: &GeneratorConfig) -> Result<()> {
    let mut checklist = export::import_checklist(file)?;
    if checklist.is_empty() {
        anyhow::bail!("No requirements in {}", file.display());
    }

    println!("{}", "Running tests...".cyan());
    let runner = PytestRunner::new(python).with_timeout(Duration::from_secs(timeout));
    let outcomes = runner.run(&checklist.requirements, config)?;

    let mut counts = [0usize; 4];
    for req in checklist.flatten() {
        let Some(outcome) = outcomes.get(&req.id) else {
            continue;
        };
        let slot = match outcome.status {
            TestStatus::Passed => 0,
            TestStatus::Failed => 1,
            TestStatus::Error => 2,
            TestStatus::Skipped => 3,
        };
        counts[slot] += 1;
        println!(
            "{}{} {} {}",
            "  ".repeat(req.depth()),
            status_marker(outcome.status),
            req.id.bold(),
            outcome.message
        );
    }

    checklist.apply_outcomes(&outcomes);
    export::export_checklist(&checklist, file)?;

    println!(
        "\nPassed: {} | Failed: {} | Errors: {} | Skipped: {}",
        counts[0].to_string().green(),
        counts[1].to_string().red(),
        counts[2].to_string().yellow(),
        counts[3]
    );
    Ok(())
}
