// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn user() -> Arg {
    Arg::new("user")
        .long("user")
        .short('u')
        .required(true)
        .help("Chat platform user id")
}

fn id() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn kind(required: bool) -> Arg {
    Arg::new("type")
        .long("type")
        .short('t')
        .required(required)
        .help("income | expense")
}

fn amount(required: bool) -> Arg {
    Arg::new("amount").long("amount").short('a').required(required)
}

fn category(required: bool) -> Arg {
    Arg::new("category").long("category").short('c').required(required)
}

fn name(required: bool) -> Arg {
    Arg::new("name").long("name").short('n').required(required)
}

fn description() -> Arg {
    Arg::new("description").long("description").short('d')
}

fn range() -> [Arg; 2] {
    [
        Arg::new("from").long("from").help("YYYY-MM-DD, inclusive"),
        Arg::new("to").long("to").help("YYYY-MM-DD, inclusive"),
    ]
}

fn json() -> [Arg; 2] {
    [
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Output as pretty JSON"),
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Output as JSON lines"),
    ]
}

pub fn build_cli() -> Command {
    Command::new("tallybot")
        .about("Chat bookkeeping assistant: parse statements, track income and expenses")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("SQLite database path (overrides TALLYBOT_DB)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging (RUST_LOG takes precedence)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("parse")
                .about("Parse a statement without recording it")
                .arg(Arg::new("text").required(true))
                .args(json()),
        )
        .subcommand(
            Command::new("chat")
                .about("Handle one chat message as the bot would")
                .arg(user())
                .arg(Arg::new("text").long("text").required(true))
                .arg(
                    Arg::new("voice")
                        .long("voice")
                        .action(ArgAction::SetTrue)
                        .help("Text is a speech-to-text transcript"),
                )
                .arg(
                    Arg::new("reply_token")
                        .long("reply-token")
                        .help("Post the reply to LINE with this token"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as pretty JSON"),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(
                    Command::new("add")
                        .arg(user())
                        .arg(kind(true))
                        .arg(amount(true))
                        .arg(category(true))
                        .arg(description())
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD (default today)")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(user())
                        .arg(kind(false))
                        .arg(category(false))
                        .args(range())
                        .arg(
                            Arg::new("page")
                                .long("page")
                                .value_parser(value_parser!(u32).range(1..))
                                .default_value("1"),
                        )
                        .arg(
                            Arg::new("per_page")
                                .long("per-page")
                                .value_parser(value_parser!(u32).range(1..=100))
                                .default_value("20"),
                        )
                        .args(json()),
                )
                .subcommand(Command::new("show").arg(user()).arg(id()).args(json()))
                .subcommand(
                    Command::new("edit")
                        .arg(user())
                        .arg(id())
                        .arg(kind(false))
                        .arg(amount(false))
                        .arg(category(false))
                        .arg(description()),
                )
                .subcommand(Command::new("rm").arg(user()).arg(id()))
                .subcommand(Command::new("categories").arg(user()).args(json())),
        )
        .subcommand(
            Command::new("stats")
                .about("Summaries and trends")
                .subcommand(
                    Command::new("summary")
                        .arg(user())
                        .args(range())
                        .args(json()),
                )
                .subcommand(
                    Command::new("by-category")
                        .arg(user())
                        .arg(kind(false))
                        .args(range())
                        .args(json()),
                )
                .subcommand(
                    Command::new("by-date")
                        .arg(user())
                        .args(range())
                        .arg(
                            Arg::new("group_by")
                                .long("group-by")
                                .default_value("day")
                                .help("day | week | month"),
                        )
                        .args(json()),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly budget")
                .subcommand(Command::new("set").arg(user()).arg(amount(true)))
                .subcommand(Command::new("show").arg(user()).args(json()))
                .subcommand(
                    Command::new("status")
                        .arg(user())
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD (default today)"))
                        .args(json()),
                ),
        )
        .subcommand(
            Command::new("recurring")
                .about("Recurring transactions")
                .subcommand(
                    Command::new("add")
                        .arg(user())
                        .arg(kind(true))
                        .arg(amount(true))
                        .arg(category(true))
                        .arg(description())
                        .arg(
                            Arg::new("day")
                                .long("day")
                                .value_parser(value_parser!(u32))
                                .default_value("1")
                                .help("Day of month, 1-28"),
                        ),
                )
                .subcommand(Command::new("list").arg(user()).args(json()))
                .subcommand(Command::new("show").arg(user()).arg(id()).args(json()))
                .subcommand(
                    Command::new("edit")
                        .arg(user())
                        .arg(id())
                        .arg(kind(false))
                        .arg(amount(false))
                        .arg(category(false))
                        .arg(description())
                        .arg(Arg::new("day").long("day").value_parser(value_parser!(u32)))
                        .arg(
                            Arg::new("active")
                                .long("active")
                                .value_parser(value_parser!(bool)),
                        ),
                )
                .subcommand(Command::new("rm").arg(user()).arg(id()))
                .subcommand(
                    Command::new("execute")
                        .about("Record entries due on the given day")
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD (default today)"))
                        .arg(Arg::new("secret").long("secret")),
                ),
        )
        .subcommand(
            Command::new("energy")
                .about("Energy coins")
                .subcommand(
                    Command::new("summary")
                        .about("Coins per tier")
                        .arg(user())
                        .args(range())
                        .args(json()),
                )
                .subcommand(
                    Command::new("history")
                        .about("Transactions that earned coins, newest first")
                        .arg(user())
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .short('t')
                                .default_value("all")
                                .help("all | gold | silver | copper"),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize))
                                .default_value("20"),
                        )
                        .args(json()),
                ),
        )
        .subcommand(
            Command::new("habit")
                .about("Daily habit check-ins")
                .subcommand(
                    Command::new("add")
                        .arg(user())
                        .arg(name(true))
                        .arg(Arg::new("emoji").long("emoji")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(user())
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD (default today)"))
                        .args(json()),
                )
                .subcommand(Command::new("show").arg(user()).arg(id()).args(json()))
                .subcommand(
                    Command::new("edit")
                        .arg(user())
                        .arg(id())
                        .arg(name(false))
                        .arg(Arg::new("emoji").long("emoji")),
                )
                .subcommand(Command::new("rm").arg(user()).arg(id()))
                .subcommand(
                    Command::new("checkin")
                        .arg(user())
                        .arg(id())
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD (default today)")),
                )
                .subcommand(
                    Command::new("uncheck")
                        .about("Cancel a check-in")
                        .arg(user())
                        .arg(id())
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD (default today)")),
                )
                .subcommand(
                    Command::new("checkins")
                        .arg(user())
                        .arg(id())
                        .args(range())
                        .args(json()),
                )
                .subcommand(
                    Command::new("stats")
                        .arg(user())
                        .arg(id())
                        .arg(Arg::new("year").long("year").value_parser(value_parser!(i32)))
                        .arg(
                            Arg::new("month")
                                .long("month")
                                .value_parser(value_parser!(u32).range(1..=12)),
                        )
                        .args(json()),
                ),
        )
        .subcommand(
            Command::new("reminder")
                .about("Fixed-expense reminders")
                .subcommand(
                    Command::new("add")
                        .arg(user())
                        .arg(name(true))
                        .arg(amount(true))
                        .arg(
                            Arg::new("day")
                                .long("day")
                                .required(true)
                                .value_parser(value_parser!(u32))
                                .help("Day of month, 1-28"),
                        ),
                )
                .subcommand(Command::new("list").arg(user()).args(json()))
                .subcommand(Command::new("show").arg(user()).arg(id()).args(json()))
                .subcommand(
                    Command::new("edit")
                        .arg(user())
                        .arg(id())
                        .arg(name(false))
                        .arg(amount(false))
                        .arg(Arg::new("day").long("day").value_parser(value_parser!(u32)))
                        .arg(
                            Arg::new("active")
                                .long("active")
                                .value_parser(value_parser!(bool)),
                        ),
                )
                .subcommand(Command::new("rm").arg(user()).arg(id())),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("transactions")
                    .arg(user())
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .short('f')
                            .required(true)
                            .help("csv | json | xlsx"),
                    )
                    .arg(Arg::new("out").long("out").short('o').required(true))
                    .args(range()),
            ),
        )
}
