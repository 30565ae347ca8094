//! Client command-line grammar and usage texts

use crate::domain::{Grammar, OptionCode};

/// Short options accepted before the command name.
pub const CLIENT_GRAMMAR: &str = "?b:c:C:d:eE:F:GRhH:M:p:P:l:L:qQ:r#sI?u:v:Vx:z:Z:";

/// Long options accepted before the command name.
pub const CLIENT_LONG_OPTIONS: &[OptionCode] = &[
    OptionCode::Client,
    OptionCode::Batchsize,
    OptionCode::User,
    OptionCode::Host,
    OptionCode::Charset,
    OptionCode::Help,
    OptionCode::Port,
    OptionCode::Password,
    OptionCode::CmdCharset,
    OptionCode::Retries,
    OptionCode::Quiet,
    OptionCode::Progress,
    OptionCode::MessageType,
    OptionCode::Directory,
    OptionCode::Variable,
    OptionCode::Xargs,
    OptionCode::Aliases,
    OptionCode::Field,
    OptionCode::Color,
    OptionCode::Script,
    OptionCode::ScriptMaxMem,
    OptionCode::ScriptMaxTime,
    OptionCode::NoScript,
    OptionCode::ScriptLang,
    OptionCode::ScriptLangVersion,
    OptionCode::ScriptApiVersion,
    OptionCode::ScriptEnableDebug,
];

pub fn client_grammar() -> Grammar {
    Grammar::new(CLIENT_GRAMMAR, CLIENT_LONG_OPTIONS)
}

/// Printed after a usage error.
pub const SHORT_USAGE: &str = "\
Usage: depot [options] command [arg ...]
    Options:
        -h -? -V -s -e -q -G -R -I
        -b batchsize -c client -C charset -d dir -E var=value
        -F format -H host -L language -M[g|j|r|p] -p port
        -P password -Q charset -r retries -u user -v level
        -x file -z var=value -Z protocol
        --field Name=value --color --explain

    Try 'depot -h' for more information.";

/// Printed by `-h` / `-?`.
pub const LONG_USAGE: &str = "\
Usage: depot [options] command [arg ...]

    Options:
        -b batchsize  number of -x lines sent per command (default 128)
        -c client     set client workspace name (P4CLIENT)
        -C charset    set character set of file content (P4CHARSET)
        -d dir        set current directory for relative paths
        -e            show output with message ids
        -E var=value  override a configuration variable for this run
        -F format     format tagged output; %field% is replaced
        -G -R         structured output (python / ruby records)
        -h -?         print this message
        -H host       set host name (P4HOST)
        -I            show progress indicators
        -l charset    same as -C
        -L language   set message language (P4LANGUAGE)
        -M[g|j|r|p]   structured output (python / json / ruby / php)
        -p port       set server address (P4PORT)
        -P password   set password (P4PASSWD)
        -q            suppress informational output
        -Q charset    set command character set (P4COMMANDCHARSET)
        -r retries    retry a command after network failures
        -s            prefix output with message type, print exit status
        -u user       set user name (P4USER)
        -v level      debug level (-v 2, -v rpc=3)
        -V            print client version
        -x file       read extra arguments from file, '-' for piped data
        -z var=value  set a command variable (-z tag for tagged output)
        -Z protocol   request a protocol setting

        --field Name=value   edit spec fields (Name+=value appends)
        --color              force coloured output (with P4COLORS)
        --explain [options]  describe the options that follow

    With -x, the command 'run' executes each line of the file as a command.";

/// `-V` output.
pub fn version_line() -> String {
    format!(
        "depot/{}/{} ({})",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION"),
        std::env::consts::ARCH
    )
}
