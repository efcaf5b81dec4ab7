pub mod gate;
pub mod logging;
pub mod serve;
pub mod whoami;

use clap::{
    ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const CMD_SERVE: &str = "serve";
pub const CMD_WHOAMI: &str = "whoami";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let serve = serve::with_args(gate::with_args(
        Command::new(CMD_SERVE).about("Run the session gate in front of a workspace"),
    ));
    let whoami = whoami::with_args(
        Command::new(CMD_WHOAMI).about("Resolve the role of a session and print it as JSON"),
    );

    let command = Command::new("portal-gate")
        .about("Session gate and role resolution for portal workspaces")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(serve)
        .subcommand(whoami);

    logging::with_args(command)
}
