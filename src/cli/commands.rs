//! Client entry point: parse, handle built-ins, negotiate, dispatch

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{debug, instrument};

use crate::application::services::{
    select_interface, BatchInput, CommandDispatcher, DebugLevels, EnvironmentNegotiator,
    Interface,
};
use crate::application::{
    ApplicationError, ApplicationResult, OptionParser, ParseOutcome, ParsedCommand, PositionalRule,
};
use crate::cli::args::{client_grammar, version_line, LONG_USAGE, SHORT_USAGE};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::Settings;
use crate::domain::{ErrorRecord, ParsedOptionSet, Severity, Subsystem};
use crate::exitcode;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{ConfigProvider, UiSink};
use crate::infrastructure::ui::ConsoleUi;
use crate::infrastructure::InfraError;

/// Result of parsing the client command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Explain(Vec<String>),
    Run(ParsedCommand),
}

impl Invocation {
    /// General debug level from `-v`, drives the log filter.
    pub fn verbosity(&self) -> u8 {
        match self {
            Invocation::Explain(_) => 0,
            Invocation::Run(cmd) => DebugLevels::from_options(&cmd.options).general,
        }
    }
}

/// Parse `args` (program name removed) with the client grammar.
pub fn parse_command_line(args: &[String]) -> CliResult<Invocation> {
    let outcome = OptionParser::new().parse(args, &client_grammar(), PositionalRule::ANY, SHORT_USAGE)?;
    Ok(match outcome {
        ParseOutcome::Explain(helps) => Invocation::Explain(helps),
        ParseOutcome::Parsed(cmd) => Invocation::Run(cmd),
    })
}

/// Run the client with real collaborators; returns the process exit code.
#[instrument(level = "debug", skip_all)]
pub fn execute(invocation: Invocation) -> CliResult<i32> {
    let cmd = match invocation {
        Invocation::Explain(helps) => {
            for help in &helps {
                output::info(help);
            }
            return Ok(exitcode::OK);
        }
        Invocation::Run(cmd) => cmd,
    };
    if let Some(code) = builtin(&cmd) {
        return Ok(code);
    }

    let settings = Settings::load()?;
    let container = ServiceContainer::new(settings);
    let mut provider = container.enviro();
    let cwd = std::env::current_dir().map_err(|e| InfraError::io("read current directory", e))?;
    execute_with(&container, &mut provider, cmd, &cwd, ConsoleUi::new)
}

/// `-h`, `-?` and `-V` are answered without connecting.
fn builtin(cmd: &ParsedCommand) -> Option<i32> {
    if cmd.options.has('h') || cmd.options.has('?') {
        output::info(LONG_USAGE);
        return Some(exitcode::OK);
    }
    if cmd.options.has('V') {
        output::info(&version_line());
        return Some(exitcode::OK);
    }
    None
}

fn batch_input(options: &ParsedOptionSet, cwd: &Path) -> ApplicationResult<BatchInput> {
    match options.get('x') {
        None => Ok(BatchInput::SingleShot),
        Some("-") => Ok(BatchInput::Piped),
        Some(file) => {
            let path = cwd.join(file);
            let handle = File::open(&path).map_err(|source| ApplicationError::Input {
                path: path.clone(),
                source,
            })?;
            Ok(BatchInput::File {
                path,
                source: Box::new(BufReader::new(handle)),
            })
        }
    }
}

/// Negotiate and dispatch with the given collaborators.
///
/// Failures before the interface exists are returned as errors; later ones
/// are reported through the interface and yield exit code 1.
pub fn execute_with<F, U>(
    container: &ServiceContainer,
    provider: &mut dyn ConfigProvider,
    cmd: ParsedCommand,
    cwd: &Path,
    make_ui: F,
) -> CliResult<i32>
where
    F: FnOnce(Interface, bool) -> U,
    U: UiSink,
{
    let ParsedCommand {
        mut options,
        positionals,
    } = cmd;

    let config = EnvironmentNegotiator::new(provider)
        .with_default_port(container.settings.default_port.clone())
        .negotiate(&mut options, cwd)?;
    // password buffer is scrubbed by now
    debug!("execute_with: options\n{}", options.dump());

    let interface = select_interface(&options, config.colors.as_deref());
    debug!("execute_with: interface={:?}", interface);
    let tagged = interface.wants_tagged();
    let mut ui = make_ui(interface, config.quiet);

    let outcome = batch_input(&options, &config.cwd)
        .and_then(|input| {
            let session = container.session(&config, tagged)?;
            let mut dispatcher = CommandDispatcher::new(Box::new(session), &config)?;
            dispatcher.dispatch(&positionals, input, &mut ui)
        });

    let code = match outcome {
        Ok(report) => report.exit_code,
        Err(e) => {
            let subsystem = match e {
                ApplicationError::Connection(_) => Subsystem::Rpc,
                _ => Subsystem::Client,
            };
            ui.error(&ErrorRecord::new(subsystem, Severity::Failed, e.to_string()));
            exitcode::FAILURE
        }
    };
    ui.finished(code);
    Ok(code)
}

/// Print a top-level error the way the client reports usage problems.
pub fn report_error(e: &CliError) {
    output::error(&e.message());
    if let Some(usage) = e.usage() {
        output::usage(usage);
    }
}
