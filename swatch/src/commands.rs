use crate::CLAP_STYLING;
use clap::{ArgGroup, arg, command};
use swatch_scanner::Viewport;

fn source_args(cmd: clap::Command, with_snapshot: bool) -> clap::Command {
    let mut sources = vec!["url", "file"];
    let mut cmd = cmd
        .arg(
            arg!(-u --"url" <URL>)
                .required(false)
                .help("The page to extract from. A missing scheme defaults to http://"),
        )
        .arg(
            arg!(-f --"file" <PATH>)
                .required(false)
                .help("A local HTML file. Relative stylesheet links are read from disk"),
        );

    if with_snapshot {
        sources.push("snapshot");
        cmd = cmd.arg(
            arg!(-s --"snapshot" <PATH>)
                .required(false)
                .help("A JSON snapshot of computed styles (see `swatch snapshot`)"),
        );
    }

    cmd.group(ArgGroup::new("source").args(sources).required(true))
}

fn loading_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(--"timeout" <SECS>)
            .required(false)
            .help("HTTP timeout in seconds for the page and each stylesheet")
            .value_parser(clap::value_parser!(u64).range(1..))
            .default_value("10"),
    )
    .arg(
        arg!(--"viewport" <SIZE>)
            .required(false)
            .help("Viewport used to evaluate media queries and viewport units, as WIDTHxHEIGHT")
            .value_parser(clap::value_parser!(Viewport))
            .default_value("1280x800"),
    )
    .arg(
        arg!(--"no-external-css")
            .required(false)
            .help("Ignore <link rel=\"stylesheet\"> references; only inline <style> blocks apply"),
    )
    .arg(arg!(-v --"verbose" "Enable debug logging").required(false))
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("swatch")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("swatch")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            loading_args(source_args(
                command!("extract").about(
                    "Extract typography, spacing, colors, borders, radii, shadows and gradients \
                from a page and copy the theme as JSON to the clipboard.",
                ),
                true,
            ))
            .arg(
                arg!(-o --"output" <PATH>)
                    .required(false)
                    .help("Write the JSON to a file instead of the clipboard")
                    .conflicts_with("stdout"),
            )
            .arg(
                arg!(--"stdout")
                    .required(false)
                    .help("Print the JSON to stdout instead of the clipboard"),
            ),
        )
        .subcommand(
            loading_args(source_args(
                command!("snapshot").about(
                    "Resolve the computed style of every element and save it as JSON for later \
                extraction.",
                ),
                false,
            ))
            .arg(
                arg!(-o --"output" <PATH>)
                    .required(false)
                    .help("Where to write the snapshot. Defaults to stdout"),
            ),
        )
}
