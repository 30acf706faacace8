// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{crate_version, Arg, ArgAction, Command};

fn owner_arg() -> Arg {
    Arg::new("owner")
        .long("owner")
        .value_name("NAME")
        .required(true)
        .help("Owner the operation applies to")
}

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("pocketledger")
        .version(crate_version!())
        .about("Multi-account personal ledger: transactions, recurring schedules, budgets, advances")
        .subcommand(
            Command::new("init")
                .about("Initialize the database")
                .arg(
                    Arg::new("currency")
                        .long("currency")
                        .value_name("CCY")
                        .help("Base currency for newly created accounts"),
                ),
        )
        .subcommand(owner_cmd())
        .subcommand(account_cmd())
        .subcommand(category_cmd())
        .subcommand(tx_cmd())
        .subcommand(recurring_cmd())
        .subcommand(budget_cmd())
        .subcommand(advance_cmd())
        .subcommand(export_cmd())
        .subcommand(
            Command::new("doctor")
                .about("Check ledger consistency (balance drift, malformed transfers)")
                .arg(
                    Arg::new("owner")
                        .long("owner")
                        .value_name("NAME")
                        .help("Restrict the check to one owner"),
                ),
        )
}

fn owner_cmd() -> Command {
    Command::new("owner")
        .about("Manage owners")
        .subcommand(
            Command::new("add")
                .about("Add an owner with default categories and a starter account")
                .arg(Arg::new("name").required(true)),
        )
        .subcommand(json_flags(Command::new("list").about("List owners")))
        .subcommand(
            Command::new("rm")
                .about("Remove an owner and everything they own")
                .arg(Arg::new("name").required(true)),
        )
}

fn account_cmd() -> Command {
    Command::new("account")
        .about("Manage accounts")
        .subcommand(
            Command::new("add")
                .about("Add an account")
                .arg(owner_arg())
                .arg(Arg::new("name").required(true))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .default_value("checking")
                        .help("Account kind: checking, savings, cash, ..."),
                )
                .arg(
                    Arg::new("currency")
                        .long("currency")
                        .help("Currency code (defaults to the base currency)"),
                )
                .arg(
                    Arg::new("balance")
                        .long("balance")
                        .default_value("0")
                        .help("Opening balance"),
                ),
        )
        .subcommand(json_flags(
            Command::new("list").about("List accounts").arg(owner_arg()),
        ))
        .subcommand(
            Command::new("rm")
                .about("Remove an account and its transactions and schedules")
                .arg(owner_arg())
                .arg(Arg::new("name").required(true)),
        )
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Manage the category tree")
        .subcommand(
            Command::new("add")
                .about("Add a category")
                .arg(owner_arg())
                .arg(Arg::new("name").required(true))
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .required(true)
                        .help("income or expense"),
                )
                .arg(
                    Arg::new("parent")
                        .long("parent")
                        .value_name("NAME")
                        .help("Parent category (same kind)"),
                )
                .arg(Arg::new("icon").long("icon"))
                .arg(Arg::new("color").long("color")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List categories")
                .arg(owner_arg()),
        ))
        .subcommand(
            Command::new("tree")
                .about("Print the category hierarchy")
                .arg(owner_arg()),
        )
        .subcommand(
            Command::new("rm")
                .about("Remove a category; children are orphaned")
                .arg(owner_arg())
                .arg(Arg::new("name").required(true)),
        )
        .subcommand(
            Command::new("reset")
                .about("Replace all categories (and budgets) with the default tree")
                .arg(owner_arg()),
        )
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Manage transactions")
        .subcommand(
            Command::new("add")
                .about("Record a transaction and update balances")
                .arg(owner_arg())
                .arg(
                    Arg::new("account")
                        .long("account")
                        .value_name("NAME")
                        .required(true),
                )
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .required(true)
                        .help("income, expense or transfer"),
                )
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(
                    Arg::new("date")
                        .long("date")
                        .value_name("YYYY-MM-DD")
                        .help("Defaults to today"),
                )
                .arg(
                    Arg::new("category")
                        .long("category")
                        .value_name("NAME"),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_name("ACCOUNT")
                        .help("Target account (transfers only)"),
                )
                .arg(Arg::new("desc").long("desc").default_value("")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List transactions")
                .arg(owner_arg())
                .arg(Arg::new("month").long("month").value_name("YYYY-MM"))
                .arg(Arg::new("account").long("account").value_name("NAME"))
                .arg(Arg::new("category").long("category").value_name("NAME"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(clap::value_parser!(usize)),
                ),
        ))
        .subcommand(
            Command::new("edit")
                .about("Edit a transaction (does not recompute balances)")
                .arg(owner_arg())
                .arg(Arg::new("id").long("id").required(true).value_parser(clap::value_parser!(i64)))
                .arg(Arg::new("amount").long("amount"))
                .arg(Arg::new("category").long("category").value_name("NAME"))
                .arg(Arg::new("desc").long("desc"))
                .arg(Arg::new("date").long("date").value_name("YYYY-MM-DD")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a transaction, reversing its balance effect")
                .arg(owner_arg())
                .arg(Arg::new("id").long("id").required(true).value_parser(clap::value_parser!(i64))),
        )
}

fn recurring_cmd() -> Command {
    Command::new("recurring")
        .about("Manage recurring transaction rules")
        .subcommand(
            Command::new("add")
                .about("Add a recurring rule")
                .arg(owner_arg())
                .arg(
                    Arg::new("account")
                        .long("account")
                        .value_name("NAME")
                        .required(true),
                )
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .required(true)
                        .help("income or expense"),
                )
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(
                    Arg::new("frequency")
                        .long("frequency")
                        .required(true)
                        .help("daily, weekly, biweekly, monthly, quarterly, semi_annual, annual"),
                )
                .arg(
                    Arg::new("start")
                        .long("start")
                        .value_name("YYYY-MM-DD")
                        .help("First occurrence (defaults to today)"),
                )
                .arg(Arg::new("end").long("end").value_name("YYYY-MM-DD"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(clap::value_parser!(i64))
                        .help("Stop after this many occurrences"),
                )
                .arg(Arg::new("category").long("category").value_name("NAME"))
                .arg(Arg::new("desc").long("desc").default_value("")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List recurring rules")
                .arg(owner_arg()),
        ))
        .subcommand(
            Command::new("process")
                .about("Materialize all due occurrences")
                .arg(owner_arg())
                .arg(
                    Arg::new("today")
                        .long("today")
                        .value_name("YYYY-MM-DD")
                        .help("Process as if today were this date"),
                ),
        )
        .subcommand(
            Command::new("edit")
                .about("Edit an active rule (a new start date resets the cursor)")
                .arg(owner_arg())
                .arg(Arg::new("id").long("id").required(true).value_parser(clap::value_parser!(i64)))
                .arg(Arg::new("kind").long("kind"))
                .arg(Arg::new("amount").long("amount"))
                .arg(Arg::new("frequency").long("frequency"))
                .arg(Arg::new("start").long("start").value_name("YYYY-MM-DD"))
                .arg(Arg::new("end").long("end").value_name("YYYY-MM-DD"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(Arg::new("category").long("category").value_name("NAME"))
                .arg(Arg::new("desc").long("desc")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a recurring rule")
                .arg(owner_arg())
                .arg(Arg::new("id").long("id").required(true).value_parser(clap::value_parser!(i64))),
        )
}

fn budget_cmd() -> Command {
    Command::new("budget")
        .about("Manage budgets")
        .subcommand(
            Command::new("add")
                .about("Add a budget for an expense category")
                .arg(owner_arg())
                .arg(
                    Arg::new("category")
                        .long("category")
                        .value_name("NAME")
                        .required(true),
                )
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(
                    Arg::new("parent")
                        .long("parent")
                        .value_parser(clap::value_parser!(i64))
                        .help("Parent budget id (one level of nesting)"),
                ),
        )
        .subcommand(json_flags(
            Command::new("list").about("List budgets").arg(owner_arg()),
        ))
        .subcommand(json_flags(
            Command::new("status")
                .about("Spend against each budget for a month")
                .arg(owner_arg())
                .arg(
                    Arg::new("month")
                        .long("month")
                        .value_name("YYYY-MM")
                        .help("Defaults to the current month"),
                ),
        ))
        .subcommand(
            Command::new("check")
                .about("Would this expense exceed the applicable budget?")
                .arg(owner_arg())
                .arg(
                    Arg::new("category")
                        .long("category")
                        .value_name("NAME")
                        .required(true),
                )
                .arg(Arg::new("amount").long("amount").required(true)),
        )
        .subcommand(
            Command::new("order")
                .about("Set budget display order")
                .arg(owner_arg())
                .arg(
                    Arg::new("ids")
                        .long("ids")
                        .required(true)
                        .help("Comma-separated budget ids, first shown first"),
                ),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a budget (children go with it)")
                .arg(owner_arg())
                .arg(Arg::new("id").long("id").required(true).value_parser(clap::value_parser!(i64))),
        )
}

fn advance_cmd() -> Command {
    Command::new("advance")
        .about("Track interpersonal loans")
        .subcommand(
            Command::new("add")
                .about("Open an advance (books a mirrored transaction unless skipped)")
                .arg(owner_arg())
                .arg(
                    Arg::new("account")
                        .long("account")
                        .value_name("NAME")
                        .required(true),
                )
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("person").long("person").required(true))
                .arg(
                    Arg::new("date")
                        .long("date")
                        .value_name("YYYY-MM-DD")
                        .help("Defaults to today"),
                )
                .arg(Arg::new("due").long("due").value_name("YYYY-MM-DD"))
                .arg(
                    Arg::new("direction")
                        .long("direction")
                        .default_value("given")
                        .help("given (money lent) or received (money borrowed)"),
                )
                .arg(Arg::new("desc").long("desc").default_value(""))
                .arg(
                    Arg::new("skip-transaction")
                        .long("skip-transaction")
                        .action(ArgAction::SetTrue)
                        .help("Do not book the mirrored transaction"),
                ),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List advances")
                .arg(owner_arg())
                .arg(Arg::new("direction").long("direction"))
                .arg(Arg::new("status").long("status"))
                .arg(Arg::new("person").long("person")),
        ))
        .subcommand(
            Command::new("pay")
                .about("Record a repayment")
                .arg(owner_arg())
                .arg(Arg::new("id").long("id").required(true).value_parser(clap::value_parser!(i64)))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(
                    Arg::new("date")
                        .long("date")
                        .value_name("YYYY-MM-DD")
                        .help("Defaults to today"),
                )
                .arg(
                    Arg::new("skip-transaction")
                        .long("skip-transaction")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(json_flags(
            Command::new("summary")
                .about("Open advances by person, plus totals")
                .arg(owner_arg())
                .arg(Arg::new("direction").long("direction")),
        ))
        .subcommand(
            Command::new("init-categories")
                .about("Provision the advance bookkeeping categories")
                .arg(owner_arg()),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete an advance")
                .arg(owner_arg())
                .arg(Arg::new("id").long("id").required(true).value_parser(clap::value_parser!(i64))),
        )
}

fn export_cmd() -> Command {
    Command::new("export").about("Export data").subcommand(
        Command::new("transactions")
            .about("Export an owner's transactions")
            .arg(owner_arg())
            .arg(
                Arg::new("format")
                    .long("format")
                    .default_value("csv")
                    .help("csv or json"),
            )
            .arg(Arg::new("out").long("out").required(true))
            .arg(Arg::new("month").long("month").value_name("YYYY-MM")),
    )
}
